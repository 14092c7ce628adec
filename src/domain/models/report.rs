//! Run report domain model.

use serde::{Deserialize, Serialize};

use super::fix::{Confidence, FixId};

/// How the orchestration driver is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Evaluate applicability only: no branches, no state mutation.
    DryRun,
    /// Execute GREEN and YELLOW fixes per gate policy.
    Apply,
    /// Force-run one fix, including RED, bypassing the gate.
    ApplyOne(FixId),
}

impl RunMode {
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::DryRun)
    }
}

/// Per-fix result in a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Dry run: the fix would execute.
    Applicable,
    /// A commit was produced on the fix's branch.
    Applied,
    /// The action ran but produced no diff.
    NoChanges,
    /// Prior applied/declined record at this version.
    AlreadySatisfied,
    /// Applicability conditions not met.
    NotApplicable,
    Failed,
    NeedsHuman,
    /// RED fix: requires explicit manual invocation.
    ManualRequired,
    /// Deterministic branch name collides with unrelated history.
    BranchConflict,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applicable => "applicable",
            Self::Applied => "applied",
            Self::NoChanges => "no_changes",
            Self::AlreadySatisfied => "already_satisfied",
            Self::NotApplicable => "not_applicable",
            Self::Failed => "failed",
            Self::NeedsHuman => "needs_human",
            Self::ManualRequired => "manual_required",
            Self::BranchConflict => "branch_conflict",
        }
    }

    /// Statuses that make the run exit non-zero.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::NeedsHuman | Self::BranchConflict)
    }
}

/// One line of the run report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub fix: FixId,
    pub version: u32,
    pub confidence: Confidence,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl ReportEntry {
    pub fn new(fix: FixId, version: u32, confidence: Confidence, status: ReportStatus) -> Self {
        Self {
            fix,
            version,
            confidence,
            status,
            branch: None,
            detail: String::new(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Ordered outcome of one engine run: one entry per considered fix, in
/// catalog order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.status.is_failure())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
