//! Error taxonomy for the fix orchestration engine.
//!
//! Run-level errors (catalog, lock, store integrity, repo preconditions)
//! abort the whole run before any branch is touched. Fix-local errors
//! (branch conflicts, action failures) are isolated: the fix is recorded
//! and the run continues with the next fix.

use std::path::PathBuf;

use thiserror::Error;

use super::models::FixId;
use super::ports::vcs::VcsError;

/// Fatal errors raised while loading the fix catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Advice root {0} is not a directory")]
    AdviceRootMissing(PathBuf),

    #[error("Unparsable fix manifest at {path}: {source}")]
    UnparsableManifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Fix {fix} declares invalid version {version} (must be >= 1)")]
    InvalidVersion { fix: FixId, version: u32 },

    #[error("Duplicate fix identity {0}")]
    DuplicateIdentity(FixId),

    #[error("Unknown fix {0}")]
    UnknownFix(FixId),

    #[error("Fix {fix} has an invalid glob {pattern:?}: {source}")]
    InvalidGlob {
        fix: FixId,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to read advice source: {0}")]
    Io(#[from] std::io::Error),
}

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Another run is already in flight against {repo_root} (state lock held)")]
    ConcurrentRun { repo_root: PathBuf },

    #[error("State store at {path} is unreadable: {detail}")]
    StateStoreCorruption { path: PathBuf, detail: String },

    #[error("{path} is not a git repository")]
    NotAGitRepository { path: PathBuf },

    #[error("{path} has a detached HEAD; check out a branch first")]
    DetachedHead { path: PathBuf },

    #[error("Uncommitted changes in the working tree; commit or stash them first")]
    DirtyWorkingTree,

    #[error("Branch {branch} for fix {fix} has history not created by this engine")]
    BranchConflict { fix: FixId, branch: String },

    #[error("Fix {fix} failed: {detail}")]
    ActionExecution { fix: FixId, detail: String },

    #[error("Version control error: {0}")]
    Vcs(#[from] VcsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Errors local to one fix never abort the run; everything else is
    /// fatal.
    pub fn is_fix_local(&self) -> bool {
        matches!(
            self,
            Self::BranchConflict { .. } | Self::ActionExecution { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_local_errors_do_not_abort_the_run() {
        let conflict = EngineError::BranchConflict {
            fix: FixId::new("ci", "pin-actions"),
            branch: "remedy/ci/pin-actions/v1".to_string(),
        };
        assert!(conflict.is_fix_local());

        let fatal = EngineError::DirtyWorkingTree;
        assert!(!fatal.is_fix_local());
    }
}
