//! Version-control backend port.
//!
//! The engine is the sole caller of these operations during a run. The
//! production adapter shells out to `git`; tests may substitute a fake.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::RepoSnapshot;

/// Errors surfaced by a version-control backend.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Not a git repository: {0}")]
    NotARepository(std::path::PathBuf),

    #[error("Detached HEAD at {0}; the engine needs a branch to return to")]
    DetachedHead(std::path::PathBuf),
}

pub type VcsResult<T> = Result<T, VcsError>;

/// Branch-per-fix operations over one working tree.
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Capture the point-in-time view the whole run evaluates against.
    /// `state_dir`, the engine's own directory inside the repo, is left out
    /// of the dirty computation.
    async fn capture_snapshot(&self, repo_root: &Path, state_dir: &str) -> VcsResult<RepoSnapshot>;

    async fn branch_exists(&self, repo_root: &Path, branch: &str) -> VcsResult<bool>;

    /// Commit id at the tip of `branch`.
    async fn branch_tip(&self, repo_root: &Path, branch: &str) -> VcsResult<String>;

    /// Create `branch` at `base` and check it out.
    async fn create_branch(&self, repo_root: &Path, branch: &str, base: &str) -> VcsResult<()>;

    /// Check out an existing branch (or any ref).
    async fn checkout(&self, repo_root: &Path, refname: &str) -> VcsResult<()>;

    /// Hard-reset the currently checked-out branch to `base`.
    async fn reset_hard(&self, repo_root: &Path, base: &str) -> VcsResult<()>;

    async fn delete_branch(&self, repo_root: &Path, branch: &str) -> VcsResult<()>;

    /// Stage every change in the working tree, including untracked files,
    /// except anything under `state_dir`.
    async fn stage_all(&self, repo_root: &Path, state_dir: &str) -> VcsResult<()>;

    /// Whether anything is staged relative to HEAD.
    async fn has_staged_changes(&self, repo_root: &Path) -> VcsResult<bool>;

    /// Commit staged changes; returns the new commit id.
    async fn commit(&self, repo_root: &Path, message: &str) -> VcsResult<String>;

    /// Head commit id of the working tree.
    async fn head_commit(&self, repo_root: &Path) -> VcsResult<String>;

    /// Discard uncommitted changes and untracked files outside `state_dir`,
    /// restoring the working tree to its checked-out commit.
    async fn restore_working_tree(&self, repo_root: &Path, state_dir: &str) -> VcsResult<()>;

    /// Full commit messages on `tip` past `base`, newest first.
    async fn commit_messages_between(
        &self,
        repo_root: &Path,
        base: &str,
        tip: &str,
    ) -> VcsResult<Vec<String>>;
}
