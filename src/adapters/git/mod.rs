//! Git adapter for the version-control port.
//!
//! Shells out to `git` with captured output so failures carry enough
//! context for the operator to resume manually.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::models::RepoSnapshot;
use crate::domain::ports::vcs::{VcsBackend, VcsError, VcsResult};

/// Record separator for splitting `git log` output into full messages.
const LOG_SEPARATOR: char = '\x1e';

/// `VcsBackend` implementation backed by the `git` CLI.
#[derive(Debug, Default, Clone)]
pub struct GitBackend;

impl GitBackend {
    pub fn new() -> Self {
        Self
    }

    /// Run git in `repo_root`, mapping a non-zero exit to `CommandFailed`.
    async fn run(&self, repo_root: &Path, args: &[&str]) -> VcsResult<String> {
        let rendered = format!("git {}", args.join(" "));
        debug!(command = %rendered, cwd = %repo_root.display(), "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(repo_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        } else {
            Err(VcsError::CommandFailed {
                command: rendered,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            })
        }
    }

    /// Run git where a non-zero exit is an answer, not an error.
    async fn run_status(&self, repo_root: &Path, args: &[&str]) -> VcsResult<bool> {
        let rendered = format!("git {}", args.join(" "));
        let status = Command::new("git")
            .args(args)
            .current_dir(repo_root)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| VcsError::Spawn {
                command: rendered,
                source,
            })?;
        Ok(status.success())
    }
}

/// Pathspec keeping the engine's own state directory out of whole-tree
/// operations.
fn exclude_pathspec(state_dir: &str) -> String {
    format!(":(exclude){state_dir}")
}

#[async_trait]
impl VcsBackend for GitBackend {
    async fn capture_snapshot(&self, repo_root: &Path, state_dir: &str) -> VcsResult<RepoSnapshot> {
        let inside = self
            .run_status(repo_root, &["rev-parse", "--is-inside-work-tree"])
            .await
            .unwrap_or(false);
        if !inside {
            return Err(VcsError::NotARepository(PathBuf::from(repo_root)));
        }

        let current_branch = self
            .run(repo_root, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        // rev-parse renders a detached HEAD as the literal "HEAD"; there is
        // no branch to return to after a fix, so refuse to run.
        if current_branch == "HEAD" {
            return Err(VcsError::DetachedHead(PathBuf::from(repo_root)));
        }
        let head_commit = self.run(repo_root, &["rev-parse", "HEAD"]).await?;
        let exclude = exclude_pathspec(state_dir);
        let porcelain = self
            .run(repo_root, &["status", "--porcelain", "--", ".", &exclude])
            .await?;

        Ok(RepoSnapshot {
            repo_root: repo_root
                .canonicalize()
                .unwrap_or_else(|_| PathBuf::from(repo_root)),
            current_branch,
            head_commit,
            dirty: !porcelain.is_empty(),
        })
    }

    async fn branch_exists(&self, repo_root: &Path, branch: &str) -> VcsResult<bool> {
        let refname = format!("refs/heads/{branch}");
        self.run_status(repo_root, &["show-ref", "--verify", "--quiet", &refname])
            .await
    }

    async fn branch_tip(&self, repo_root: &Path, branch: &str) -> VcsResult<String> {
        self.run(repo_root, &["rev-parse", branch]).await
    }

    async fn create_branch(&self, repo_root: &Path, branch: &str, base: &str) -> VcsResult<()> {
        self.run(repo_root, &["checkout", "-b", branch, base]).await?;
        Ok(())
    }

    async fn checkout(&self, repo_root: &Path, refname: &str) -> VcsResult<()> {
        self.run(repo_root, &["checkout", refname]).await?;
        Ok(())
    }

    async fn reset_hard(&self, repo_root: &Path, base: &str) -> VcsResult<()> {
        self.run(repo_root, &["reset", "--hard", base]).await?;
        Ok(())
    }

    async fn delete_branch(&self, repo_root: &Path, branch: &str) -> VcsResult<()> {
        self.run(repo_root, &["branch", "-D", branch]).await?;
        Ok(())
    }

    async fn stage_all(&self, repo_root: &Path, state_dir: &str) -> VcsResult<()> {
        let exclude = exclude_pathspec(state_dir);
        self.run(repo_root, &["add", "-A", "--", ".", &exclude])
            .await?;
        Ok(())
    }

    async fn has_staged_changes(&self, repo_root: &Path) -> VcsResult<bool> {
        // Exit 1 means there is a staged diff.
        let clean = self
            .run_status(repo_root, &["diff", "--cached", "--quiet"])
            .await?;
        Ok(!clean)
    }

    async fn commit(&self, repo_root: &Path, message: &str) -> VcsResult<String> {
        self.run(repo_root, &["commit", "-m", message]).await?;
        self.head_commit(repo_root).await
    }

    async fn head_commit(&self, repo_root: &Path) -> VcsResult<String> {
        self.run(repo_root, &["rev-parse", "HEAD"]).await
    }

    async fn restore_working_tree(&self, repo_root: &Path, state_dir: &str) -> VcsResult<()> {
        self.run(repo_root, &["checkout", "--", "."]).await?;
        self.run(repo_root, &["clean", "-fd", "-e", state_dir]).await?;
        Ok(())
    }

    async fn commit_messages_between(
        &self,
        repo_root: &Path,
        base: &str,
        tip: &str,
    ) -> VcsResult<Vec<String>> {
        let range = format!("{base}..{tip}");
        let format = format!("--format=%B%x{:02x}", LOG_SEPARATOR as u32);
        let raw = self.run(repo_root, &["log", &format, &range]).await?;
        Ok(raw
            .split(LOG_SEPARATOR)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect())
    }
}
