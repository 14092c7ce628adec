//! Fix record domain model.
//!
//! The persisted outcome of a fix's most recent evaluation or execution
//! against one target repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal outcome of one fix attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    /// The fix ran and produced a commit on its branch.
    Applied,
    /// An operator declined the fix at this version; sticky per version.
    Declined,
    /// The fix did not apply, or applied without producing a diff.
    NotApplicable,
    /// The fix's action failed.
    Failed,
    /// The fix failed (or ran as RED) and needs a human to finish.
    NeedsHuman,
}

impl FixOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Declined => "declined",
            Self::NotApplicable => "not_applicable",
            Self::Failed => "failed",
            Self::NeedsHuman => "needs_human",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "applied" => Some(Self::Applied),
            "declined" => Some(Self::Declined),
            "not_applicable" => Some(Self::NotApplicable),
            "failed" => Some(Self::Failed),
            "needs_human" => Some(Self::NeedsHuman),
            _ => None,
        }
    }

    /// Whether this outcome short-circuits re-evaluation at the same fix
    /// version. Failures and non-applicability are always re-evaluated.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Applied | Self::Declined)
    }
}

/// One persisted record of a fix attempt.
///
/// Keyed externally by fix identity in the state store; at most one record
/// per identity is current, superseded records are kept as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixRecord {
    /// Descriptor version this record was made against.
    pub fix_version: u32,
    pub outcome: FixOutcome,
    pub recorded_at: DateTime<Utc>,
    /// Branch (or commit) reference left behind, when one survives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Short human detail: commit subject, or the failure's stderr tail.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl FixRecord {
    pub fn new(fix_version: u32, outcome: FixOutcome) -> Self {
        Self {
            fix_version,
            outcome,
            recorded_at: Utc::now(),
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
