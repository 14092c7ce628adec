//! Command-line interface for the remedy engine.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use console::style;

use crate::domain::errors::EngineError;

#[derive(Parser, Debug)]
#[command(
    name = "remedy",
    version,
    about = "Applies a catalog of versioned fixes to a target repository, one reviewable branch per fix"
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    /// Target repository, defaulting to the current directory
    #[arg(long, global = true, default_value = ".")]
    pub target: String,

    /// Advice source directory holding fix descriptors
    #[arg(long, global = true, env = "REMEDY_ADVICE_DIR")]
    pub advice_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available fixes and how they would gate
    List(commands::list::ListArgs),
    /// Show recorded fix outcomes for the target repository
    Status(commands::status::StatusArgs),
    /// Evaluate and execute applicable fixes per gate policy
    Apply(commands::apply::ApplyArgs),
    /// Force-run one fix, including RED, bypassing the gate
    ApplyOne(commands::apply_one::ApplyOneArgs),
    /// Record a sticky per-version decline for a fix
    Decline(commands::decline::DeclineArgs),
}

/// Map a fatal error to stderr output and an exit code. Fix-local errors
/// never reach here; they are folded into the run report.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> i32 {
    if json_mode {
        eprintln!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::ConcurrentRun { .. }) => 3,
        Some(_) | None => 2,
    }
}
