//! End-to-end scenarios over real scratch git repositories.

mod common;

use std::fs;

use common::{
    branch_exists, current_branch, driver, driver_with_config, git, init_repo, license_fix,
    working_tree_clean, write_fix,
};
use tempfile::TempDir;

use remedy::cli::commands::decline::{self, DeclineArgs};
use remedy::cli::commands::status::{self, StatusArgs};
use remedy::{
    EngineConfig, EngineError, FixFilter, FixId, FixOutcome, ReportStatus, RunMode, StateStore,
};

const LICENSE_BRANCH: &str = "remedy/licensing/add-license-header/v1";

fn all() -> FixFilter {
    FixFilter::default()
}

#[tokio::test]
async fn green_fix_applies_on_its_own_branch() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 1);
    let entry = &report.entries[0];
    assert_eq!(entry.status, ReportStatus::Applied);
    assert_eq!(entry.branch.as_deref(), Some(LICENSE_BRANCH));

    // branch carries the LICENSE, the operator's branch does not
    assert!(branch_exists(repo.path(), LICENSE_BRANCH));
    assert_eq!(current_branch(repo.path()), "main");
    assert!(!repo.path().join("LICENSE").exists());
    assert!(working_tree_clean(repo.path()));
    let on_branch = git(
        repo.path(),
        &["show", &format!("{LICENSE_BRANCH}:LICENSE")],
    );
    assert_eq!(on_branch, "MIT License");

    // outcome recorded
    let store = StateStore::open_read_only(repo.path(), ".remedy").unwrap();
    let record = store
        .current(&FixId::new("licensing", "add-license-header"))
        .unwrap();
    assert_eq!(record.outcome, FixOutcome::Applied);
    assert_eq!(record.fix_version, 1);
}

#[tokio::test]
async fn second_run_is_already_satisfied_and_never_re_executes() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    let d = driver(repo.path(), advice.path());
    d.run(RunMode::Apply, &all()).await.unwrap();
    let tip_before = git(repo.path(), &["rev-parse", LICENSE_BRANCH]);

    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::AlreadySatisfied);
    // branch untouched: the action did not run again
    assert_eq!(git(repo.path(), &["rev-parse", LICENSE_BRANCH]), tip_before);
}

#[tokio::test]
async fn dry_run_creates_no_branch_and_mutates_nothing() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    let report = driver(repo.path(), advice.path())
        .run(RunMode::DryRun, &all())
        .await
        .unwrap();

    assert_eq!(report.entries[0].status, ReportStatus::Applicable);
    assert!(!branch_exists(repo.path(), LICENSE_BRANCH));
    assert!(!repo.path().join(".remedy/state.json").exists());
    assert!(working_tree_clean(repo.path()));
}

#[tokio::test]
async fn failing_action_restores_tree_and_keeps_branch() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    write_fix(
        advice.path(),
        "broken/half-write",
        "version: 1\n\
         confidence: yellow\n\
         apply:\n\
         \x20 steps:\n\
         \x20   - copy: { source: files/junk.txt, dest: junk.txt }\n\
         \x20   - run: { command: ['./explode.sh'] }\n",
        &[
            ("files/junk.txt", "partial edit\n"),
            ("explode.sh", "#!/bin/sh\necho boom >&2\nexit 7\n"),
        ],
    );

    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    let entry = &report.entries[0];
    assert_eq!(entry.status, ReportStatus::Failed);
    assert!(entry.detail.contains("boom"));

    // partial edit discarded, tree byte-identical to pre-execution
    assert!(!repo.path().join("junk.txt").exists());
    assert!(working_tree_clean(repo.path()));
    assert_eq!(current_branch(repo.path()), "main");

    // branch retained for inspection, FAILED recorded
    assert!(branch_exists(repo.path(), "remedy/broken/half-write/v1"));
    let store = StateStore::open_read_only(repo.path(), ".remedy").unwrap();
    let record = store.current(&FixId::new("broken", "half-write")).unwrap();
    assert_eq!(record.outcome, FixOutcome::Failed);
}

#[tokio::test]
async fn failed_branch_can_be_auto_cleaned() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    write_fix(
        advice.path(),
        "broken/simple",
        "version: 1\nconfidence: yellow\napply: { steps: [ { run: { command: ['false'] } } ] }\n",
        &[],
    );

    let config = EngineConfig {
        auto_clean_failed: true,
        ..EngineConfig::default()
    };
    let report = driver_with_config(repo.path(), advice.path(), config)
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    assert_eq!(report.entries[0].status, ReportStatus::Failed);
    assert!(!branch_exists(repo.path(), "remedy/broken/simple/v1"));
}

#[tokio::test]
async fn red_fix_is_never_auto_executed() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "red", 1);

    let d = driver(repo.path(), advice.path());
    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::ManualRequired);
    assert!(!branch_exists(repo.path(), LICENSE_BRANCH));

    // explicit invocation bypasses the gate
    let id = FixId::new("licensing", "add-license-header");
    let report = d.run(RunMode::ApplyOne(id), &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::Applied);
    assert!(branch_exists(repo.path(), LICENSE_BRANCH));
}

#[tokio::test]
async fn red_fix_failure_is_recorded_as_needs_human() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    write_fix(
        advice.path(),
        "risky/migration",
        "version: 1\nconfidence: red\napply: { steps: [ { run: { command: ['false'] } } ] }\n",
        &[],
    );

    let id = FixId::new("risky", "migration");
    let report = driver(repo.path(), advice.path())
        .run(RunMode::ApplyOne(id.clone()), &all())
        .await
        .unwrap();

    assert_eq!(report.entries[0].status, ReportStatus::NeedsHuman);
    let store = StateStore::open_read_only(repo.path(), ".remedy").unwrap();
    assert_eq!(store.current(&id).unwrap().outcome, FixOutcome::NeedsHuman);
}

#[tokio::test]
async fn version_bump_supersedes_prior_applied_record() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    // advice author ships v2; main still lacks a LICENSE
    license_fix(advice.path(), "green", 2);
    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    assert_eq!(report.entries[0].status, ReportStatus::Applied);
    assert!(branch_exists(
        repo.path(),
        "remedy/licensing/add-license-header/v2"
    ));
    let store = StateStore::open_read_only(repo.path(), ".remedy").unwrap();
    let record = store
        .current(&FixId::new("licensing", "add-license-header"))
        .unwrap();
    assert_eq!(record.fix_version, 2);
}

#[tokio::test]
async fn noop_fix_records_not_applicable_and_leaves_no_branch() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    write_fix(
        advice.path(),
        "tidy/nothing-to-do",
        "version: 1\nconfidence: green\napply: { steps: [ { run: { command: ['true'] } } ] }\n",
        &[],
    );

    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    assert_eq!(report.entries[0].status, ReportStatus::NoChanges);
    assert!(!branch_exists(repo.path(), "remedy/tidy/nothing-to-do/v1"));
    let store = StateStore::open_read_only(repo.path(), ".remedy").unwrap();
    let record = store.current(&FixId::new("tidy", "nothing-to-do")).unwrap();
    assert_eq!(record.outcome, FixOutcome::NotApplicable);
}

#[tokio::test]
async fn unrelated_branch_with_same_name_is_a_conflict_and_run_continues() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);
    write_fix(
        advice.path(),
        "tidy/gitignore",
        "version: 1\n\
         confidence: green\n\
         order: 200\n\
         applicability: { files_absent: [.gitignore] }\n\
         apply: { steps: [ { copy: { source: files/gitignore, dest: .gitignore } } ] }\n",
        &[("files/gitignore", "target/\n")],
    );

    // an unrelated human commit squats on the deterministic branch name
    git(repo.path(), &["checkout", "-q", "-b", LICENSE_BRANCH]);
    fs::write(repo.path().join("NOTES.txt"), "mine\n").unwrap();
    git(repo.path(), &["add", "-A"]);
    git(repo.path(), &["commit", "-q", "-m", "human work"]);
    git(repo.path(), &["checkout", "-q", "main"]);
    let squatted_tip = git(repo.path(), &["rev-parse", LICENSE_BRANCH]);

    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].status, ReportStatus::BranchConflict);
    // never overwritten
    assert_eq!(git(repo.path(), &["rev-parse", LICENSE_BRANCH]), squatted_tip);
    // isolation: the next fix still ran
    assert_eq!(report.entries[1].status, ReportStatus::Applied);
    assert!(branch_exists(repo.path(), "remedy/tidy/gitignore/v1"));
}

#[tokio::test]
async fn engine_branch_left_from_a_lost_state_file_is_reused() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    let d = driver(repo.path(), advice.path());
    d.run(RunMode::Apply, &all()).await.unwrap();

    // state lost (fresh clone, wiped dir); branch with the engine commit
    // remains and must be reused, not flagged as a conflict
    fs::remove_dir_all(repo.path().join(".remedy")).unwrap();
    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::Applied);
}

#[tokio::test]
async fn dirty_working_tree_fails_fast_in_apply_mode() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);
    fs::write(repo.path().join("README.md"), "# dirty\n").unwrap();

    let err = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DirtyWorkingTree));

    // dry run tolerates the dirty tree
    let report = driver(repo.path(), advice.path())
        .run(RunMode::DryRun, &all())
        .await
        .unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::Applicable);
}

#[tokio::test]
async fn concurrent_invocation_fails_fast() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    let _held = StateStore::open(repo.path(), ".remedy").unwrap();
    let err = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConcurrentRun { .. }));
}

#[tokio::test]
async fn non_git_directory_is_rejected() {
    let plain = TempDir::new().unwrap();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);

    let err = driver(plain.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAGitRepository { .. }));
}

#[tokio::test]
async fn check_command_gates_applicability() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    write_fix(
        advice.path(),
        "ci/needs-makefile",
        "version: 1\n\
         confidence: green\n\
         applicability: { check_command: ['./has_makefile.sh'] }\n\
         apply: { steps: [ { copy: { source: files/ci.yaml, dest: ci.yaml } } ] }\n",
        &[
            ("has_makefile.sh", "#!/bin/sh\ntest -f Makefile\n"),
            ("files/ci.yaml", "jobs: {}\n"),
        ],
    );

    let d = driver(repo.path(), advice.path());
    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::NotApplicable);

    fs::write(repo.path().join("Makefile"), "all:\n").unwrap();
    git(repo.path(), &["add", "-A"]);
    git(repo.path(), &["commit", "-q", "-m", "add makefile"]);

    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::Applied);
}

#[tokio::test]
async fn engine_state_directory_stays_out_of_git() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);
    write_fix(
        advice.path(),
        "broken/boom",
        "version: 1\n\
         confidence: yellow\n\
         order: 200\n\
         apply: { steps: [ { run: { command: ['false'] } } ] }\n",
        &[],
    );

    let d = driver(repo.path(), advice.path());
    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::Applied);
    assert_eq!(report.entries[1].status, ReportStatus::Failed);

    // the store survives both the commit and the failure cleanup
    assert!(repo.path().join(".remedy/state.json").exists());
    assert!(repo.path().join(".remedy/state.lock").exists());

    // the fix commit carries the fix's files and nothing of the engine's
    let committed = git(
        repo.path(),
        &["show", "--name-only", "--format=", LICENSE_BRANCH],
    );
    assert!(committed.contains("LICENSE"));
    assert!(!committed.contains(".remedy"));

    // the untracked state dir does not read as a dirty tree on re-runs
    let report = d.run(RunMode::Apply, &all()).await.unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::AlreadySatisfied);
}

#[tokio::test]
async fn detached_head_is_rejected() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);
    git(repo.path(), &["checkout", "-q", "--detach"]);

    let err = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DetachedHead { .. }));
}

#[tokio::test]
async fn declined_fix_is_skipped_until_its_version_changes() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);
    let target = repo.path().to_str().unwrap();
    let advice_flag = advice.path().to_str().unwrap();

    let code = decline::execute(
        DeclineArgs {
            fix_id: "licensing/add-license-header".to_string(),
            reason: "repo has a custom license".to_string(),
        },
        target,
        Some(advice_flag),
        true,
    )
    .await
    .unwrap();
    assert_eq!(code, 0);

    let id = FixId::new("licensing", "add-license-header");
    {
        let store = StateStore::open_read_only(repo.path(), ".remedy").unwrap();
        let record = store.current(&id).unwrap();
        assert_eq!(record.outcome, FixOutcome::Declined);
        assert_eq!(record.detail, "repo has a custom license");
    }

    // declined at v1: apply skips it and leaves no branch
    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::AlreadySatisfied);
    assert!(!branch_exists(repo.path(), LICENSE_BRANCH));

    // a version bump un-sticks the decline
    license_fix(advice.path(), "green", 2);
    let report = driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();
    assert_eq!(report.entries[0].status, ReportStatus::Applied);
}

#[tokio::test]
async fn status_command_needs_no_advice_dir_but_rejects_bad_targets() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    license_fix(advice.path(), "green", 1);
    driver(repo.path(), advice.path())
        .run(RunMode::Apply, &all())
        .await
        .unwrap();

    let target = repo.path().to_str().unwrap();
    let code = status::execute(StatusArgs {}, target, None, true)
        .await
        .unwrap();
    assert_eq!(code, 0);

    let missing = status::execute(StatusArgs {}, "/definitely/not/here", None, true).await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn catalog_order_is_respected_in_the_report() {
    let repo = init_repo();
    let advice = TempDir::new().unwrap();
    write_fix(advice.path(), "b/second", "version: 1\nconfidence: green\n", &[]);
    write_fix(advice.path(), "a/third", "version: 1\nconfidence: green\norder: 150\n", &[]);
    write_fix(advice.path(), "c/first", "version: 1\nconfidence: green\norder: 10\n", &[]);

    let report = driver(repo.path(), advice.path())
        .run(RunMode::DryRun, &all())
        .await
        .unwrap();

    let ids: Vec<String> = report.entries.iter().map(|e| e.fix.to_string()).collect();
    assert_eq!(ids, vec!["c/first", "b/second", "a/third"]);
}
