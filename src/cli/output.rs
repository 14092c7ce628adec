//! Output formatting utilities for the CLI.

use console::style;
use serde::Serialize;

use crate::domain::models::{Confidence, ReportStatus, RunReport};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

/// Render a fix name colored by its confidence, the way operators scan the
/// list: green safe, yellow review, red hands-on.
pub fn styled_fix(name: &str, confidence: Confidence) -> String {
    match confidence {
        Confidence::Green => style(name).green().to_string(),
        Confidence::Yellow => style(name).yellow().to_string(),
        Confidence::Red => style(name).red().to_string(),
    }
}

pub fn styled_status(status: ReportStatus) -> String {
    let text = status.as_str();
    if status.is_failure() {
        style(text).red().to_string()
    } else {
        match status {
            ReportStatus::Applied | ReportStatus::Applicable => {
                style(text).green().to_string()
            }
            ReportStatus::ManualRequired => style(text).yellow().to_string(),
            _ => style(text).dim().to_string(),
        }
    }
}

/// Wrapper giving a `RunReport` the shared output behavior.
#[derive(Serialize)]
pub struct ReportView {
    pub report: RunReport,
}

impl CommandOutput for ReportView {
    fn to_human(&self) -> String {
        if self.report.is_empty() {
            return "No fixes selected.".to_string();
        }
        let mut lines = Vec::with_capacity(self.report.entries.len());
        for entry in &self.report.entries {
            let mut line = format!(
                "{} (v{}): {}",
                styled_fix(&entry.fix.to_string(), entry.confidence),
                entry.version,
                styled_status(entry.status),
            );
            if let Some(branch) = &entry.branch {
                line.push_str(&format!(" [{branch}]"));
            }
            if !entry.detail.is_empty() {
                line.push_str(&format!(" - {}", entry.detail));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.report).unwrap_or_default()
    }
}
