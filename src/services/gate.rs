//! Confidence gate: policy mapping from a fix's confidence level to how
//! autonomously it may execute.

use crate::domain::models::{Confidence, FixDescriptor, FixOutcome};

/// What the gate permits for one fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// GREEN: auto-execute, auto-merge permitted.
    AutoMerge,
    /// YELLOW: auto-execute, branch requires human review before merge.
    AutoReview,
    /// RED: never auto-executed; listed for explicit manual invocation.
    ManualOnly,
}

impl GateDecision {
    pub fn for_fix(descriptor: &FixDescriptor) -> Self {
        match descriptor.confidence {
            Confidence::Green => Self::AutoMerge,
            Confidence::Yellow => Self::AutoReview,
            Confidence::Red => Self::ManualOnly,
        }
    }

    /// Whether APPLY mode may execute this fix without an operator naming
    /// it explicitly.
    pub fn auto_executes(&self) -> bool {
        !matches!(self, Self::ManualOnly)
    }
}

/// Outcome recorded when a fix's action fails: RED and manual-followup
/// fixes are handed back to a human rather than marked failed.
pub fn failure_outcome(descriptor: &FixDescriptor) -> FixOutcome {
    if descriptor.confidence == Confidence::Red || descriptor.requires_manual_followup {
        FixOutcome::NeedsHuman
    } else {
        FixOutcome::Failed
    }
}
