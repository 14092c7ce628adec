//! CLI argument parsing round-trips.

use clap::Parser;
use remedy::cli::{Cli, Commands};

#[test]
fn parse_apply_with_names_and_dry_run() {
    let cli = Cli::try_parse_from(vec![
        "remedy",
        "apply",
        "licensing/add-license-header",
        "ci",
        "--dry-run",
        "--confidence",
        "yellow",
    ])
    .unwrap();

    match cli.command {
        Commands::Apply(args) => {
            assert_eq!(
                args.fix_ids,
                vec!["licensing/add-license-header", "ci"]
            );
            assert!(args.dry_run);
            assert!(!args.all);
            assert_eq!(args.confidence.as_deref(), Some("yellow"));
        }
        _ => panic!("wrong top-level command"),
    }
}

#[test]
fn parse_apply_all() {
    let cli = Cli::try_parse_from(vec!["remedy", "apply", "--all"]).unwrap();
    match cli.command {
        Commands::Apply(args) => {
            assert!(args.all);
            assert!(args.fix_ids.is_empty());
            assert!(!args.dry_run);
        }
        _ => panic!("wrong top-level command"),
    }
}

#[test]
fn parse_apply_one() {
    let cli = Cli::try_parse_from(vec![
        "remedy",
        "--target",
        "/srv/checkout",
        "--advice-dir",
        "/srv/advice",
        "apply-one",
        "risky/migration",
    ])
    .unwrap();

    assert_eq!(cli.target, "/srv/checkout");
    assert_eq!(cli.advice_dir.as_deref(), Some("/srv/advice"));
    match cli.command {
        Commands::ApplyOne(args) => {
            assert_eq!(args.fix_id, "risky/migration");
            assert!(!args.dry_run);
        }
        _ => panic!("wrong top-level command"),
    }
}

#[test]
fn parse_decline_with_reason() {
    let cli = Cli::try_parse_from(vec![
        "remedy",
        "decline",
        "licensing/add-license-header",
        "--reason",
        "repo has a custom license",
    ])
    .unwrap();

    match cli.command {
        Commands::Decline(args) => {
            assert_eq!(args.fix_id, "licensing/add-license-header");
            assert_eq!(args.reason, "repo has a custom license");
        }
        _ => panic!("wrong top-level command"),
    }
}

#[test]
fn parse_list_and_status_with_global_json() {
    let cli = Cli::try_parse_from(vec!["remedy", "--json", "list"]).unwrap();
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::List(_)));

    let cli = Cli::try_parse_from(vec!["remedy", "status", "--json"]).unwrap();
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::Status(_)));
}

#[test]
fn target_defaults_to_current_directory() {
    let cli = Cli::try_parse_from(vec!["remedy", "list"]).unwrap();
    assert_eq!(cli.target, ".");
}
