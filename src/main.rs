//! Remedy CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use remedy::cli::{handle_error, Cli, Commands};
use remedy::domain::models::LoggingConfig;
use remedy::ConfigLoader;

/// Build the subscriber from the target's logging config. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken target or config still gets logging; the command itself
    // reports the real error.
    let logging = std::path::Path::new(&cli.target)
        .canonicalize()
        .ok()
        .and_then(|root| ConfigLoader::load(&root).ok())
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    let target = cli.target.clone();
    let advice_dir = cli.advice_dir.clone();

    let result = match cli.command {
        Commands::List(args) => {
            remedy::cli::commands::list::execute(args, &target, advice_dir.as_deref(), cli.json)
                .await
        }
        Commands::Status(args) => {
            remedy::cli::commands::status::execute(args, &target, advice_dir.as_deref(), cli.json)
                .await
        }
        Commands::Apply(args) => {
            remedy::cli::commands::apply::execute(args, &target, advice_dir.as_deref(), cli.json)
                .await
        }
        Commands::ApplyOne(args) => {
            remedy::cli::commands::apply_one::execute(
                args,
                &target,
                advice_dir.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Decline(args) => {
            remedy::cli::commands::decline::execute(args, &target, advice_dir.as_deref(), cli.json)
                .await
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => handle_error(&err, cli.json),
    };
    std::process::exit(code);
}
