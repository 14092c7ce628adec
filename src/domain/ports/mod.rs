//! Ports (trait interfaces) implemented by adapters.

pub mod vcs;

pub use vcs::{VcsBackend, VcsError, VcsResult};
