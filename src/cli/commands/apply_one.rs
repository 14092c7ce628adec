//! `remedy apply-one` - force-run a single fix, bypassing the gate.
//!
//! This is how RED fixes get executed: an operator names them explicitly.

use anyhow::Result;
use clap::Args;

use super::RunContext;
use crate::cli::output::{output, ReportView};
use crate::domain::models::{FixId, RunMode};
use crate::services::catalog::FixFilter;

#[derive(Args, Debug)]
pub struct ApplyOneArgs {
    /// Full fix identity, e.g. licensing/add-license-header
    pub fix_id: String,

    /// Evaluate applicability only
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

pub async fn execute(
    args: ApplyOneArgs,
    target: &str,
    advice_dir: Option<&str>,
    json: bool,
) -> Result<i32> {
    let id: FixId = args
        .fix_id
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let ctx = RunContext::resolve(target, advice_dir)?;
    let driver = ctx.driver(ctx.load_catalog()?);

    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::ApplyOne(id.clone())
    };
    let filter = FixFilter {
        min_confidence: None,
        names: vec![id.to_string()],
    };

    let report = driver.run(mode, &filter).await?;
    let failed = report.has_failures();
    output(&ReportView { report }, json);
    Ok(i32::from(failed))
}
