//! `remedy status` - show recorded fix outcomes for the target repository.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::services::StateStore;

#[derive(Args, Debug)]
pub struct StatusArgs {}

#[derive(Serialize)]
struct StatusEntry {
    fix: String,
    version: u32,
    outcome: String,
    recorded_at: String,
    branch: Option<String>,
}

#[derive(Serialize)]
struct StatusView {
    records: Vec<StatusEntry>,
}

impl CommandOutput for StatusView {
    fn to_human(&self) -> String {
        if self.records.is_empty() {
            return "No fixes recorded for this repository.".to_string();
        }
        let mut lines = Vec::with_capacity(self.records.len());
        for r in &self.records {
            let branch = r
                .branch
                .as_ref()
                .map(|b| format!(" [{b}]"))
                .unwrap_or_default();
            lines.push(format!(
                "{} (v{}): {} at {}{branch}",
                r.fix, r.version, r.outcome, r.recorded_at
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    _args: StatusArgs,
    target: &str,
    _advice_dir: Option<&str>,
    json: bool,
) -> Result<i32> {
    // needs only the target's config and state store, never the catalog,
    // so an unconfigured advice dir is not an error here
    let repo_root = std::path::PathBuf::from(target)
        .canonicalize()
        .with_context(|| format!("target {target} does not exist"))?;
    let config = ConfigLoader::load(&repo_root)?;
    show(&repo_root, &config.state_dir, json)
}

fn show(repo_root: &std::path::Path, state_dir: &str, json: bool) -> Result<i32> {
    let store = StateStore::open_read_only(repo_root, state_dir)?;
    let records = store
        .iter_current()
        .map(|(id, record)| StatusEntry {
            fix: id.to_string(),
            version: record.fix_version,
            outcome: record.outcome.as_str().to_string(),
            recorded_at: record.recorded_at.to_rfc3339(),
            branch: record.branch.clone(),
        })
        .collect();
    output(&StatusView { records }, json);
    Ok(0)
}
