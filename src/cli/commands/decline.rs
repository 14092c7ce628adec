//! `remedy decline` - record a sticky per-version decline for a fix.
//!
//! A declined fix stays out of future runs until its descriptor version is
//! bumped, at which point it is re-evaluated like any other fix.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::RunContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::CatalogError;
use crate::domain::models::{FixId, FixOutcome, FixRecord};
use crate::services::StateStore;

#[derive(Args, Debug)]
pub struct DeclineArgs {
    /// Full fix identity, e.g. licensing/add-license-header
    pub fix_id: String,

    /// Why the fix was declined (kept in the record for audit)
    #[arg(short, long, default_value = "")]
    pub reason: String,
}

#[derive(Serialize)]
struct DeclineView {
    fix: String,
    version: u32,
}

impl CommandOutput for DeclineView {
    fn to_human(&self) -> String {
        format!(
            "Declined {} at v{}; it stays skipped until the fix version changes.",
            self.fix, self.version
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    args: DeclineArgs,
    target: &str,
    advice_dir: Option<&str>,
    json: bool,
) -> Result<i32> {
    let id: FixId = args
        .fix_id
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let ctx = RunContext::resolve(target, advice_dir)?;
    let catalog = ctx.load_catalog()?;
    let descriptor = catalog
        .find(&id)
        .ok_or(CatalogError::UnknownFix(id.clone()))
        .context("cannot decline a fix that is not in the catalog")?;

    let mut store = StateStore::open(&ctx.repo_root, &ctx.config.state_dir)?;
    let record = FixRecord::new(descriptor.version, FixOutcome::Declined)
        .with_detail(args.reason);
    store.record(&id, record);
    store.flush()?;

    output(
        &DeclineView {
            fix: id.to_string(),
            version: descriptor.version,
        },
        json,
    );
    Ok(0)
}
