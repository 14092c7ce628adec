//! Remedy - Fix Orchestration Engine
//!
//! Remedy applies a catalog of versioned, independently-authored fixes from
//! an advice repository to a target git repository. Each fix runs on its
//! own deterministically-named branch so its effects can be reviewed,
//! tested, and rolled back independently; outcomes are recorded in a
//! per-repository state file; a confidence gate decides which fixes run
//! autonomously and which wait for a human.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports, and the error taxonomy
//! - **Service Layer** (`services`): catalog, evaluator, state store,
//!   branch workflow, confidence gate, orchestration driver
//! - **Adapters** (`adapters`): the git backend
//! - **Infrastructure Layer** (`infrastructure`): configuration loading
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::GitBackend;
pub use domain::errors::{CatalogError, EngineError, EngineResult};
pub use domain::models::{
    Confidence, EngineConfig, FixDescriptor, FixId, FixOutcome, FixRecord, RepoSnapshot,
    ReportEntry, ReportStatus, RunMode, RunReport,
};
pub use domain::ports::{VcsBackend, VcsError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    Applicability, FixCatalog, FixFilter, GateDecision, OrchestrationDriver, StateStore,
};
