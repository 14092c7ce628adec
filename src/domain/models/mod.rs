//! Domain models for the fix orchestration engine.

pub mod config;
pub mod fix;
pub mod record;
pub mod report;
pub mod snapshot;

pub use config::{EngineConfig, LoggingConfig};
pub use fix::{
    ApplicabilityRules, ApplyPlan, ApplyStep, Confidence, FixDescriptor, FixId, FixManifest,
};
pub use record::{FixOutcome, FixRecord};
pub use report::{ReportEntry, ReportStatus, RunMode, RunReport};
pub use snapshot::RepoSnapshot;
