//! Applicability evaluator.
//!
//! Pure, read-only decision per fix: prior-record short-circuits first,
//! then the manifest's declarative conditions against the repository
//! snapshot. Because nothing here mutates, the driver evaluates every fix
//! concurrently before any execution starts.

use std::path::Path;
use std::process::Stdio;

use globset::{Glob, GlobSetBuilder};
use tokio::process::Command;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    ApplicabilityRules, FixDescriptor, FixRecord, RepoSnapshot,
};

/// Evaluation result for one fix against one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Applicable,
    /// Applied or declined at the current descriptor version.
    AlreadySatisfied,
    NotApplicable,
    /// A prior record exists at another version and the fix applies again.
    SupersededRequiresRerun,
}

impl Applicability {
    /// Whether the fix should be handed to the workflow controller.
    pub fn wants_execution(&self) -> bool {
        matches!(self, Self::Applicable | Self::SupersededRequiresRerun)
    }
}

/// Evaluate one fix. Rule order:
///
/// 1. Declined at the descriptor's version: sticky, already satisfied.
/// 2. Applied at the descriptor's version: already satisfied.
/// 3. Any record at another version: evaluate fresh against current code;
///    if applicable the result is `SupersededRequiresRerun`.
/// 4. No relevant record: the manifest conditions decide.
///
/// Failed / needs-human / not-applicable priors never short-circuit; those
/// fixes are re-evaluated every run.
#[instrument(skip_all, fields(fix = %descriptor.id))]
pub async fn evaluate(
    descriptor: &FixDescriptor,
    snapshot: &RepoSnapshot,
    prior: Option<&FixRecord>,
) -> EngineResult<Applicability> {
    let superseded = match prior {
        Some(record) if record.fix_version == descriptor.version => {
            if record.outcome.is_settled() {
                debug!(outcome = record.outcome.as_str(), "Prior record settles this version");
                return Ok(Applicability::AlreadySatisfied);
            }
            false
        }
        Some(record) => {
            debug!(
                prior_version = record.fix_version,
                version = descriptor.version,
                "Prior record superseded, re-evaluating"
            );
            record.outcome.is_settled()
        }
        None => false,
    };

    let applies = conditions_hold(descriptor, &descriptor.applicability, snapshot).await?;
    Ok(match (applies, superseded) {
        (true, true) => Applicability::SupersededRequiresRerun,
        (true, false) => Applicability::Applicable,
        (false, _) => Applicability::NotApplicable,
    })
}

/// All populated condition groups must hold. An empty rule set is
/// unconditionally applicable.
async fn conditions_hold(
    descriptor: &FixDescriptor,
    rules: &ApplicabilityRules,
    snapshot: &RepoSnapshot,
) -> EngineResult<bool> {
    let root = snapshot.repo_root();

    for path in &rules.files_absent {
        if root.join(path).exists() {
            debug!(path, "files_absent violated");
            return Ok(false);
        }
    }
    for path in &rules.files_present {
        if !root.join(path).exists() {
            debug!(path, "files_present violated");
            return Ok(false);
        }
    }
    if !rules.globs_match_any.is_empty()
        && !any_glob_matches(descriptor, &rules.globs_match_any, root)?
    {
        debug!("globs_match_any violated");
        return Ok(false);
    }
    if let Some(command) = &rules.check_command {
        if !check_command_passes(descriptor, command, root).await? {
            debug!("check_command violated");
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_glob_matches(
    descriptor: &FixDescriptor,
    patterns: &[String],
    root: &Path,
) -> EngineResult<bool> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // already validated at catalog load; kept fix-local either way
        builder.add(Glob::new(pattern).map_err(|e| EngineError::ActionExecution {
            fix: descriptor.id.clone(),
            detail: format!("invalid glob {pattern}: {e}"),
        })?);
    }
    let set = builder
        .build()
        .map_err(|e| EngineError::ActionExecution {
            fix: descriptor.id.clone(),
            detail: format!("glob set: {e}"),
        })?;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name().to_string_lossy() != ".git")
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            if set.is_match(rel) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Exit 0 means applicable. The command is read-only by the fix author's
/// contract; the evaluator does not verify that.
async fn check_command_passes(
    descriptor: &FixDescriptor,
    command: &[String],
    root: &Path,
) -> EngineResult<bool> {
    let Some((program, args)) = command.split_first() else {
        return Ok(true);
    };
    // Relative programs resolve against the fix directory so advice repos
    // can ship their own check scripts.
    let program_path = resolve_program(program, &descriptor.fix_dir);

    let status = Command::new(&program_path)
        .args(args)
        .current_dir(root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| EngineError::ActionExecution {
            fix: descriptor.id.clone(),
            detail: format!("check command {program} failed to start: {e}"),
        })?;
    Ok(status.success())
}

pub(crate) fn resolve_program(program: &str, fix_dir: &Path) -> std::path::PathBuf {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 && as_path.is_relative() {
        fix_dir.join(as_path)
    } else {
        as_path.to_path_buf()
    }
}
