//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Runs git in `dir`, panicking with its output on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to start git");
    assert!(
        output.status.success(),
        "git {} failed\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Creates an upstream repository at `<tmp>/acme/widgets` with a `main`
/// branch and a `feature-x` branch carrying `feature.txt`.
pub fn create_upstream(tmp: &TempDir) -> PathBuf {
    let repo = tmp.path().join("acme").join("widgets");
    std::fs::create_dir_all(&repo).expect("failed to create upstream dir");

    git(&repo, &["init"]);
    git(&repo, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&repo, &["config", "user.email", "test@test.com"]);
    git(&repo, &["config", "user.name", "Test User"]);

    std::fs::write(repo.join("README.md"), "# Widgets\n").expect("failed to write readme");
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "initial"]);

    git(&repo, &["checkout", "-b", "feature-x"]);
    std::fs::write(repo.join("feature.txt"), "feature\n").expect("failed to write feature");
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "add feature"]);
    git(&repo, &["checkout", "main"]);

    repo
}

/// Adds a commit with `file` to `branch` of the upstream repository.
pub fn commit_to_branch(repo: &Path, branch: &str, file: &str) {
    git(repo, &["checkout", branch]);
    std::fs::write(repo.join(file), "more\n").expect("failed to write file");
    git(repo, &["add", "."]);
    git(repo, &["commit", "-m", &format!("add {}", file)]);
    git(repo, &["checkout", "main"]);
}

/// Shell script printing one failure block for `test_foo` and exiting 1.
pub const FAILING_SUITE: &str = "printf '%s\\n' \
    '============================= FAILURES =============================' \
    '________ test_foo ________' \
    '>       assert compute() == 2' \
    'E       assert 1 == 2' \
    'FAILED tests/test_foo.py::test_foo - assert 1 == 2'; exit 1";

/// Reason the failure parser extracts from [`FAILING_SUITE`].
pub const FAILING_REASON: &str = "tests/test_foo.py::test_foo - assert 1 == 2";

/// Issue body expected for the [`FAILING_SUITE`] failure on `branch`.
pub fn expected_body(branch: &str) -> String {
    format!(
        "Branch: `{}`\n\nFailure Reason:\n```\n{}\n```",
        branch, FAILING_REASON
    )
}
