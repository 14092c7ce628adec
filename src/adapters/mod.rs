//! Adapters implementing domain ports against external systems.

pub mod git;

pub use git::GitBackend;
