//! Orchestration driver: the end-to-end run over one target repository.
//!
//! Composes catalog, evaluator, gate, workflow controller, and state store.
//! Evaluation is concurrent (it is pure); execution is strictly sequential
//! in catalog order, since each fix owns the working tree while it runs.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument};

use crate::domain::errors::{CatalogError, EngineError, EngineResult};
use crate::domain::models::{
    EngineConfig, FixDescriptor, ReportEntry, ReportStatus, RunMode, RunReport,
};
use crate::domain::ports::vcs::{VcsBackend, VcsError};
use crate::services::branch_workflow::BranchWorkflowController;
use crate::services::catalog::{FixCatalog, FixFilter};
use crate::services::evaluator::{self, Applicability};
use crate::services::gate::GateDecision;
use crate::services::state_store::StateStore;

pub struct OrchestrationDriver {
    catalog: FixCatalog,
    vcs: Arc<dyn VcsBackend>,
    config: EngineConfig,
    repo_root: PathBuf,
}

impl OrchestrationDriver {
    pub fn new(
        catalog: FixCatalog,
        vcs: Arc<dyn VcsBackend>,
        config: EngineConfig,
        repo_root: PathBuf,
    ) -> Self {
        Self {
            catalog,
            vcs,
            config,
            repo_root,
        }
    }

    /// Run the engine once over the target repository.
    ///
    /// The state store is never partially updated: records are written and
    /// flushed only when a fix reaches its Recorded state.
    #[instrument(skip_all, fields(repo = %self.repo_root.display(), ?mode))]
    pub async fn run(&self, mode: RunMode, filter: &FixFilter) -> EngineResult<RunReport> {
        let snapshot = self
            .vcs
            .capture_snapshot(&self.repo_root, &self.config.state_dir)
            .await
            .map_err(|e| match e {
                VcsError::NotARepository(path) => EngineError::NotAGitRepository { path },
                VcsError::DetachedHead(path) => EngineError::DetachedHead { path },
                other => EngineError::Vcs(other),
            })?;

        // Lock and preconditions before anything else; a dry run stays
        // read-only and tolerates a dirty tree.
        let mut store = if mode.mutates() {
            if snapshot.dirty {
                return Err(EngineError::DirtyWorkingTree);
            }
            StateStore::open(&snapshot.repo_root, &self.config.state_dir)?
        } else {
            StateStore::open_read_only(&snapshot.repo_root, &self.config.state_dir)?
        };

        let selected: Vec<&FixDescriptor> = match &mode {
            RunMode::ApplyOne(id) => {
                let descriptor = self
                    .catalog
                    .find(id)
                    .ok_or_else(|| CatalogError::UnknownFix(id.clone()))?;
                vec![descriptor]
            }
            _ => self
                .catalog
                .fixes()
                .iter()
                .filter(|f| filter.includes(f))
                .collect(),
        };
        info!(total = self.catalog.len(), selected = selected.len(), "Catalog loaded");

        // Pure phase: evaluate everything up front, concurrently.
        let evaluations = join_all(selected.iter().map(|descriptor| {
            let prior = store.current(&descriptor.id);
            evaluator::evaluate(descriptor, &snapshot, prior)
        }))
        .await;

        let controller = BranchWorkflowController::new(self.vcs.as_ref(), &snapshot, &self.config);
        let mut report = RunReport::default();

        for (descriptor, evaluation) in selected.into_iter().zip(evaluations) {
            let entry_base = |status| {
                ReportEntry::new(
                    descriptor.id.clone(),
                    descriptor.version,
                    descriptor.confidence,
                    status,
                )
            };

            let applicability = match evaluation {
                Ok(a) => a,
                // A broken check command is the fix author's bug; isolate
                // it like any other fix-local failure.
                Err(e) if e.is_fix_local() => {
                    report.push(entry_base(ReportStatus::Failed).with_detail(e.to_string()));
                    continue;
                }
                Err(e) => return Err(e),
            };

            match applicability {
                Applicability::AlreadySatisfied => {
                    report.push(entry_base(ReportStatus::AlreadySatisfied));
                }
                Applicability::NotApplicable => {
                    report.push(entry_base(ReportStatus::NotApplicable));
                }
                Applicability::Applicable | Applicability::SupersededRequiresRerun => {
                    let gate = GateDecision::for_fix(descriptor);
                    match &mode {
                        RunMode::DryRun => {
                            let status = if gate.auto_executes() {
                                ReportStatus::Applicable
                            } else {
                                ReportStatus::ManualRequired
                            };
                            report.push(entry_base(status));
                        }
                        RunMode::Apply if !gate.auto_executes() => {
                            report.push(
                                entry_base(ReportStatus::ManualRequired)
                                    .with_detail("run `remedy apply-one` to execute this fix"),
                            );
                        }
                        RunMode::Apply | RunMode::ApplyOne(_) => {
                            let entry = controller.execute(descriptor, &mut store).await?;
                            report.push(entry);
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}
