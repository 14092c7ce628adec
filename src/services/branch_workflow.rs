//! Branch workflow controller.
//!
//! Executes one fix inside its own deterministically-named branch, as an
//! explicit state machine:
//!
//! ```text
//! Pending -> Branched -> Executing -> {Succeeded, NoOp, Failed} -> Recorded
//! ```
//!
//! Any failure before a record is written aborts the whole run (the error
//! propagates); failures of the fix itself are contained, recorded, and
//! leave the working tree clean for the next fix.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    ApplyStep, EngineConfig, FixDescriptor, FixId, FixOutcome, FixRecord, RepoSnapshot,
    ReportEntry, ReportStatus,
};
use crate::domain::ports::vcs::VcsBackend;
use crate::services::evaluator::resolve_program;
use crate::services::gate::failure_outcome;
use crate::services::state_store::StateStore;

/// Trailer stamped on every engine commit; used to recognize branches the
/// engine itself created on earlier runs.
pub const COMMIT_TRAILER: &str = "Remedy-Fix:";

/// Deterministic branch name for a fix identity and version, so re-runs
/// are idempotent and collisions detectable.
pub fn branch_name(prefix: &str, id: &FixId, version: u32) -> String {
    format!("{prefix}/{id}/v{version}")
}

/// Per-fix state machine position. Recorded is the only success-path
/// terminal; aborting (an error escaping `execute`) is the other.
#[derive(Debug)]
enum WorkflowState {
    Pending,
    Branched,
    Executing,
    Succeeded { commit: String },
    NoOp,
    Failed { detail: String, conflict: bool },
    Recorded { entry: ReportEntry },
}

/// Executes fixes one at a time against the working tree captured in the
/// snapshot. Owns no state beyond its collaborators; all persistence goes
/// through the state store.
pub struct BranchWorkflowController<'a> {
    vcs: &'a dyn VcsBackend,
    snapshot: &'a RepoSnapshot,
    config: &'a EngineConfig,
}

impl<'a> BranchWorkflowController<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, snapshot: &'a RepoSnapshot, config: &'a EngineConfig) -> Self {
        Self {
            vcs,
            snapshot,
            config,
        }
    }

    /// Drive one fix from Pending to Recorded.
    ///
    /// Errors local to the fix (branch conflicts, action failures) are
    /// recorded and folded into the returned report entry; only run-level
    /// failures (store flush, unrecoverable tree state) escape as `Err`.
    #[instrument(skip_all, fields(fix = %descriptor.id, version = descriptor.version))]
    pub async fn execute(
        &self,
        descriptor: &FixDescriptor,
        store: &mut StateStore,
    ) -> EngineResult<ReportEntry> {
        let branch = branch_name(&self.config.branch_prefix, &descriptor.id, descriptor.version);
        let repo = self.snapshot.repo_root();
        let base = self.snapshot.head_commit.as_str();

        let mut state = WorkflowState::Pending;
        loop {
            state = match state {
                WorkflowState::Pending => match self
                    .ensure_branch(&descriptor.id, repo, &branch, base)
                    .await
                {
                    Ok(()) => WorkflowState::Branched,
                    Err(EngineError::BranchConflict { .. }) => WorkflowState::Failed {
                        detail: format!("branch {branch} has history not created by this engine"),
                        conflict: true,
                    },
                    Err(e) => WorkflowState::Failed {
                        detail: e.to_string(),
                        conflict: false,
                    },
                },

                WorkflowState::Branched => WorkflowState::Executing,

                WorkflowState::Executing => match self.run_steps(descriptor, repo).await {
                    Ok(()) => {
                        self.vcs.stage_all(repo, &self.config.state_dir).await?;
                        if self.vcs.has_staged_changes(repo).await? {
                            let commit = self
                                .vcs
                                .commit(repo, &commit_message(descriptor))
                                .await?;
                            WorkflowState::Succeeded { commit }
                        } else {
                            // the action may have committed on its own
                            let head = self.vcs.head_commit(repo).await?;
                            if head == base {
                                WorkflowState::NoOp
                            } else {
                                WorkflowState::Succeeded { commit: head }
                            }
                        }
                    }
                    Err(e) => {
                        // Discard partial edits so the next fix (and the
                        // operator) sees a clean tree.
                        self.vcs
                            .restore_working_tree(repo, &self.config.state_dir)
                            .await?;
                        WorkflowState::Failed {
                            detail: e.to_string(),
                            conflict: false,
                        }
                    }
                },

                WorkflowState::Succeeded { commit } => {
                    self.vcs.checkout(repo, &self.snapshot.current_branch).await?;
                    info!(branch = %branch, commit = %commit, "Fix applied");
                    let record = FixRecord::new(descriptor.version, FixOutcome::Applied)
                        .with_branch(&branch)
                        .with_detail(format!("commit {commit}"));
                    store.record(&descriptor.id, record);
                    store.flush()?;
                    let entry = ReportEntry::new(
                        descriptor.id.clone(),
                        descriptor.version,
                        descriptor.confidence,
                        ReportStatus::Applied,
                    )
                    .with_branch(&branch);
                    WorkflowState::Recorded { entry }
                }

                WorkflowState::NoOp => {
                    // No diff: not a success, not a failure. Drop the empty
                    // branch so it doesn't pollute the branch list.
                    self.vcs.checkout(repo, &self.snapshot.current_branch).await?;
                    self.vcs.delete_branch(repo, &branch).await?;
                    debug!(branch = %branch, "Fix produced no diff");
                    let record = FixRecord::new(descriptor.version, FixOutcome::NotApplicable)
                        .with_detail("no changes needed");
                    store.record(&descriptor.id, record);
                    store.flush()?;
                    let entry = ReportEntry::new(
                        descriptor.id.clone(),
                        descriptor.version,
                        descriptor.confidence,
                        ReportStatus::NoChanges,
                    );
                    WorkflowState::Recorded { entry }
                }

                WorkflowState::Failed { detail, conflict } => {
                    self.vcs.checkout(repo, &self.snapshot.current_branch).await?;
                    let branch_kept = if conflict {
                        // never touch a conflicting branch
                        false
                    } else if self.config.auto_clean_failed {
                        if self.vcs.branch_exists(repo, &branch).await? {
                            self.vcs.delete_branch(repo, &branch).await?;
                        }
                        false
                    } else {
                        self.vcs.branch_exists(repo, &branch).await?
                    };

                    let outcome = failure_outcome(descriptor);
                    warn!(fix = %descriptor.id, outcome = outcome.as_str(), %detail, "Fix failed");
                    let mut record =
                        FixRecord::new(descriptor.version, outcome).with_detail(&detail);
                    if branch_kept {
                        record = record.with_branch(&branch);
                    }
                    store.record(&descriptor.id, record);
                    store.flush()?;

                    let status = if conflict {
                        ReportStatus::BranchConflict
                    } else if outcome == FixOutcome::NeedsHuman {
                        ReportStatus::NeedsHuman
                    } else {
                        ReportStatus::Failed
                    };
                    let mut entry = ReportEntry::new(
                        descriptor.id.clone(),
                        descriptor.version,
                        descriptor.confidence,
                        status,
                    )
                    .with_detail(&detail);
                    if branch_kept {
                        entry = entry.with_branch(&branch);
                    }
                    WorkflowState::Recorded { entry }
                }

                WorkflowState::Recorded { entry } => return Ok(entry),
            };
        }
    }

    /// Pending -> Branched: create the deterministic branch at the base,
    /// or reuse it when it is unmodified or attributable to this engine.
    async fn ensure_branch(
        &self,
        fix: &FixId,
        repo: &Path,
        branch: &str,
        base: &str,
    ) -> EngineResult<()> {
        if !self.vcs.branch_exists(repo, branch).await? {
            self.vcs.create_branch(repo, branch, base).await?;
            return Ok(());
        }

        let tip = self.vcs.branch_tip(repo, branch).await?;
        if tip == base {
            self.vcs.checkout(repo, branch).await?;
            return Ok(());
        }

        let messages = self
            .vcs
            .commit_messages_between(repo, base, &tip)
            .await?;
        let attributable = messages.iter().all(|m| m.contains(COMMIT_TRAILER));
        if attributable {
            debug!(branch, "Reusing engine-created branch, resetting to base");
            self.vcs.checkout(repo, branch).await?;
            self.vcs.reset_hard(repo, base).await?;
            Ok(())
        } else {
            Err(EngineError::BranchConflict {
                fix: fix.clone(),
                branch: branch.to_string(),
            })
        }
    }

    /// Branched -> Executing: run the apply plan inside the working tree.
    async fn run_steps(&self, descriptor: &FixDescriptor, repo: &Path) -> EngineResult<()> {
        for step in &descriptor.apply.steps {
            match step {
                ApplyStep::Copy { source, dest } => {
                    let from = descriptor.fix_dir.join(source);
                    let to = repo.join(dest);
                    debug!(from = %from.display(), to = %to.display(), "Copy step");
                    if let Some(parent) = to.parent() {
                        tokio::fs::create_dir_all(parent).await.map_err(|e| {
                            EngineError::ActionExecution {
                                fix: descriptor.id.clone(),
                                detail: format!("creating {}: {e}", parent.display()),
                            }
                        })?;
                    }
                    tokio::fs::copy(&from, &to).await.map_err(|e| {
                        EngineError::ActionExecution {
                            fix: descriptor.id.clone(),
                            detail: format!("copying {source} to {dest}: {e}"),
                        }
                    })?;
                }
                ApplyStep::Run { command } => {
                    self.run_command(descriptor, command, repo).await?;
                }
            }
        }
        Ok(())
    }

    /// Run one external command with captured output for diagnostics.
    async fn run_command(
        &self,
        descriptor: &FixDescriptor,
        command: &[String],
        repo: &Path,
    ) -> EngineResult<()> {
        let Some((program, args)) = command.split_first() else {
            return Ok(());
        };
        let program_path = resolve_program(program, &descriptor.fix_dir);
        debug!(program = %program_path.display(), ?args, "Run step");

        let output = Command::new(&program_path)
            .args(args)
            .current_dir(repo)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| EngineError::ActionExecution {
                fix: descriptor.id.clone(),
                detail: format!("{program} failed to start: {e}"),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(EngineError::ActionExecution {
                fix: descriptor.id.clone(),
                detail: format!(
                    "{program} exited with {}: {}",
                    output.status.code().unwrap_or(-1),
                    tail(&stderr, 800),
                ),
            })
        }
    }
}

fn commit_message(descriptor: &FixDescriptor) -> String {
    let mut message = format!("Apply {} (v{})", descriptor.id, descriptor.version);
    if !descriptor.next_steps.is_empty() {
        message.push('\n');
        for step in &descriptor.next_steps {
            message.push('\n');
            message.push_str(step);
        }
    }
    message.push_str(&format!(
        "\n\n{} {} v{}",
        COMMIT_TRAILER, descriptor.id, descriptor.version
    ));
    message
}

fn tail(s: &str, max: usize) -> &str {
    let trimmed = s.trim_end();
    if trimmed.len() <= max {
        trimmed
    } else {
        let start = trimmed.len() - max;
        // keep the cut on a char boundary
        let start = (start..trimmed.len())
            .find(|i| trimmed.is_char_boundary(*i))
            .unwrap_or(start);
        &trimmed[start..]
    }
}
