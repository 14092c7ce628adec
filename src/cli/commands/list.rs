//! `remedy list` - show the catalog and how each fix gates.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::RunContext;
use crate::cli::output::{output, styled_fix, CommandOutput};
use crate::domain::models::Confidence;
use crate::services::catalog::FixFilter;
use crate::services::GateDecision;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show fixes at least this confident (red, yellow, green)
    #[arg(short, long)]
    pub confidence: Option<String>,
}

#[derive(Serialize)]
struct ListEntry {
    fix: String,
    version: u32,
    confidence: Confidence,
    auto: bool,
    summary: String,
}

#[derive(Serialize)]
struct ListView {
    fixes: Vec<ListEntry>,
}

impl CommandOutput for ListView {
    fn to_human(&self) -> String {
        if self.fixes.is_empty() {
            return "No fixes in the advice directory.".to_string();
        }
        let mut lines = vec!["Available fixes:".to_string()];
        for entry in &self.fixes {
            let manual = if entry.auto { "" } else { " (manual)" };
            let summary = if entry.summary.is_empty() {
                String::new()
            } else {
                format!(" - {}", entry.summary)
            };
            lines.push(format!(
                "* {} (v{}){manual}{summary}",
                styled_fix(&entry.fix, entry.confidence),
                entry.version,
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    args: ListArgs,
    target: &str,
    advice_dir: Option<&str>,
    json: bool,
) -> Result<i32> {
    let ctx = RunContext::resolve(target, advice_dir)?;
    let catalog = ctx.load_catalog()?;

    let filter = FixFilter {
        min_confidence: parse_confidence(args.confidence.as_deref())?,
        names: Vec::new(),
    };

    let fixes = catalog
        .fixes()
        .iter()
        .filter(|f| filter.includes(f))
        .map(|f| ListEntry {
            fix: f.id.to_string(),
            version: f.version,
            confidence: f.confidence,
            auto: GateDecision::for_fix(f).auto_executes(),
            summary: f.summary.clone(),
        })
        .collect();

    output(&ListView { fixes }, json);
    Ok(0)
}

pub(super) fn parse_confidence(raw: Option<&str>) -> Result<Option<Confidence>> {
    raw.map(|s| {
        Confidence::from_str(s)
            .ok_or_else(|| anyhow::anyhow!("unknown confidence {s}; expected red, yellow or green"))
    })
    .transpose()
}
