use assert_fs::TempDir;
use assert_fs::prelude::*;
use common::command::{knot_output, repository_dir, run_knot_command};
use predicates::prelude::*;
use rstest::rstest;

mod common;

#[rstest]
fn new_repository_initiated_with_git_directory(repository_dir: TempDir) {
    let git_dir = repository_dir.path().canonicalize().unwrap().join(".git");

    run_knot_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Initialized empty Git repository in"))
        .stdout(predicate::str::contains(git_dir.display().to_string()));

    repository_dir.child(".git/objects").assert(predicate::path::is_dir());
    repository_dir.child(".git/refs/heads").assert(predicate::path::is_dir());
    repository_dir.child(".git/refs/tags").assert(predicate::path::is_dir());
    repository_dir
        .child(".git/HEAD")
        .assert("ref: refs/heads/master\n");
    repository_dir.child(".git/index").assert(predicate::path::missing());
    repository_dir
        .child(".git/config")
        .assert("[core]\n\trepositoryformatversion = 0\n");
}

#[rstest]
fn init_accepts_a_target_path(repository_dir: TempDir) {
    let target = repository_dir.child("nested/project");

    run_knot_command(repository_dir.path(), &["init", "nested/project"])
        .assert()
        .success();

    target.child(".git/HEAD").assert(predicate::path::is_file());
}

#[rstest]
fn reinitializing_keeps_head(repository_dir: TempDir) {
    run_knot_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir
        .child(".git/HEAD")
        .write_str("ref: refs/heads/main\n")
        .unwrap();

    run_knot_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Reinitialized existing Git repository in"));

    repository_dir.child(".git/HEAD").assert("ref: refs/heads/main\n");
}

#[rstest]
fn object_format_is_recorded_at_init(repository_dir: TempDir) {
    run_knot_command(repository_dir.path(), &["init"])
        .env("KNOT_OBJECT_FORMAT", "sha256")
        .assert()
        .success();
    repository_dir
        .child(".git/config")
        .assert(predicate::str::contains("objectformat = sha256"));

    repository_dir.child("a.txt").write_str("alpha").unwrap();
    run_knot_command(repository_dir.path(), &["add", "a.txt"])
        .assert()
        .success();

    let tree = knot_output(repository_dir.path(), &["write-tree"]);
    assert_eq!(tree.len(), 64);
    assert!(tree.chars().all(|c| c.is_ascii_hexdigit()));
}

#[rstest]
fn conflicting_object_format_is_rejected(repository_dir: TempDir) {
    run_knot_command(repository_dir.path(), &["init"])
        .env("KNOT_OBJECT_FORMAT", "sha256")
        .assert()
        .success();

    run_knot_command(repository_dir.path(), &["write-tree"])
        .env("KNOT_OBJECT_FORMAT", "sha1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid format"));
}

#[rstest]
fn reinitializing_keeps_recorded_format(repository_dir: TempDir) {
    run_knot_command(repository_dir.path(), &["init"])
        .env("KNOT_OBJECT_FORMAT", "sha256")
        .assert()
        .success();

    run_knot_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    repository_dir
        .child(".git/config")
        .assert(predicate::str::contains("objectformat = sha256"));
}
