//! Service layer: the engine's moving parts.

pub mod branch_workflow;
pub mod catalog;
pub mod driver;
pub mod evaluator;
pub mod gate;
pub mod state_store;

pub use branch_workflow::{branch_name, BranchWorkflowController, COMMIT_TRAILER};
pub use catalog::{FixCatalog, FixFilter};
pub use driver::OrchestrationDriver;
pub use evaluator::Applicability;
pub use gate::GateDecision;
pub use state_store::StateStore;
