//! Target repository snapshot.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Read-only, point-in-time view of the target repository, captured once
/// per run. Applicability evaluation and branch forking use only this view,
/// so no fix observes a partially-mutated tree from a sibling still in
/// flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSnapshot {
    /// Absolute path of the repository root.
    pub repo_root: PathBuf,
    /// Branch checked out when the run began; restored after each fix.
    pub current_branch: String,
    /// Head commit id; every fix branch forks from here.
    pub head_commit: String,
    /// Whether the working tree had uncommitted changes at capture time.
    pub dirty: bool,
}

impl RepoSnapshot {
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}
