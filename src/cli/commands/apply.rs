//! `remedy apply` - run the engine over the target repository.

use anyhow::Result;
use clap::Args;

use super::list::parse_confidence;
use super::RunContext;
use crate::cli::output::{output, ReportView};
use crate::domain::models::RunMode;
use crate::services::catalog::FixFilter;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Fix identities (or namespaces) to consider; requires --all when empty
    pub fix_ids: Vec<String>,

    /// Consider every fix in the catalog
    #[arg(short, long)]
    pub all: bool,

    /// Evaluate applicability only: no branches, no state changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only consider fixes at least this confident (red, yellow, green)
    #[arg(short, long)]
    pub confidence: Option<String>,
}

pub async fn execute(
    args: ApplyArgs,
    target: &str,
    advice_dir: Option<&str>,
    json: bool,
) -> Result<i32> {
    if args.all && !args.fix_ids.is_empty() {
        anyhow::bail!("pass either --all or fix names, not both");
    }
    if !args.all && args.fix_ids.is_empty() {
        anyhow::bail!("nothing selected; pass fix names or --all");
    }

    let ctx = RunContext::resolve(target, advice_dir)?;
    let driver = ctx.driver(ctx.load_catalog()?);

    let filter = FixFilter {
        min_confidence: parse_confidence(args.confidence.as_deref())?,
        names: args.fix_ids,
    };
    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Apply
    };

    let report = driver.run(mode, &filter).await?;
    let failed = report.has_failures();
    output(&ReportView { report }, json);
    Ok(i32::from(failed))
}
