//! Shared helpers for integration tests: scratch git repositories and
//! on-disk advice directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;

use remedy::{EngineConfig, FixCatalog, GitBackend, OrchestrationDriver};

/// Run git in `dir`, panicking on failure (test setup must not limp on).
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn git {args:?}: {e}"));
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

/// Create a scratch repository on branch `main` with one commit.
pub fn init_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.name", "Remedy Tests"]);
    git(dir, &["config", "user.email", "tests@example.invalid"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    fs::write(dir.join("README.md"), "# fixture\n").unwrap();
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", "initial"]);
    tmp
}

pub fn branch_exists(dir: &Path, branch: &str) -> bool {
    Command::new("git")
        .args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .current_dir(dir)
        .status()
        .unwrap()
        .success()
}

pub fn current_branch(dir: &Path) -> String {
    git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Clean apart from the engine's own state directory, which lives in the
/// repo but stays untracked.
pub fn working_tree_clean(dir: &Path) -> bool {
    git(dir, &["status", "--porcelain", "--", ".", ":(exclude).remedy"]).is_empty()
}

/// Write one fix directory (manifest plus optional payload files) under
/// the advice root.
pub fn write_fix(advice_root: &Path, rel: &str, manifest: &str, payload: &[(&str, &str)]) {
    let dir = advice_root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("fix.yaml"), manifest).unwrap();
    for (name, contents) in payload {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        #[cfg(unix)]
        if name.ends_with(".sh") {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }
}

/// Build a driver over a repo and advice root with default config.
pub fn driver(repo: &Path, advice_root: &Path) -> OrchestrationDriver {
    driver_with_config(repo, advice_root, EngineConfig::default())
}

pub fn driver_with_config(
    repo: &Path,
    advice_root: &Path,
    config: EngineConfig,
) -> OrchestrationDriver {
    let catalog = FixCatalog::load(advice_root).unwrap();
    OrchestrationDriver::new(
        catalog,
        Arc::new(GitBackend::new()),
        config,
        PathBuf::from(repo),
    )
}

/// The add-license-header fixture used across scenarios.
pub fn license_fix(advice_root: &Path, confidence: &str, version: u32) {
    write_fix(
        advice_root,
        "licensing/add-license-header",
        &format!(
            "version: {version}\n\
             confidence: {confidence}\n\
             summary: add a LICENSE file\n\
             applicability:\n\
             \x20 files_absent: [LICENSE]\n\
             apply:\n\
             \x20 steps:\n\
             \x20   - copy: {{ source: files/LICENSE, dest: LICENSE }}\n"
        ),
        &[("files/LICENSE", "MIT License\n")],
    );
}
