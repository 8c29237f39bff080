use crate::common::{AUTHOR_DATE, AUTHOR_EMAIL, AUTHOR_NAME};
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// An initialized repository holding `1.txt`, `a/2.txt` and `a/b/3.txt`,
/// staged but not committed
#[fixture]
pub fn staged_repository_dir(repository_dir: TempDir) -> TempDir {
    run_knot_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    repository_dir.child("1.txt").write_str("one").unwrap();
    repository_dir.child("a/2.txt").write_str("two").unwrap();
    repository_dir.child("a/b/3.txt").write_str("three").unwrap();

    run_knot_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    repository_dir
}

#[fixture]
pub fn committed_repository_dir(staged_repository_dir: TempDir) -> TempDir {
    knot_commit(staged_repository_dir.path(), "Initial commit")
        .assert()
        .success();

    staged_repository_dir
}

pub fn run_knot_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("knot").expect("Failed to find knot binary");
    cmd.current_dir(dir)
        .args(args)
        .env("GIT_AUTHOR_NAME", AUTHOR_NAME)
        .env("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL)
        .env("GIT_AUTHOR_DATE", AUTHOR_DATE)
        .env_remove("GIT_COMMITTER_NAME")
        .env_remove("KNOT_OBJECT_FORMAT")
        .env_remove("KNOT_VERIFY_OBJECTS")
        .env_remove("RUST_LOG");
    cmd
}

pub fn knot_commit(dir: &Path, message: &str) -> Command {
    run_knot_command(dir, &["commit", "-m", message])
}

/// Trimmed stdout of a command that must succeed
pub fn knot_output(dir: &Path, args: &[&str]) -> String {
    let output = run_knot_command(dir, args).assert().success();
    String::from_utf8_lossy(&output.get_output().stdout)
        .trim()
        .to_string()
}
