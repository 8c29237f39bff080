use assert_fs::TempDir;
use assert_fs::prelude::*;
use common::command::{knot_output, repository_dir, run_knot_command, staged_repository_dir};
use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

mod common;

#[fixture]
fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_knot_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir
}

#[rstest]
fn add_files_from_nested_directories_to_index_successfully(staged_repository_dir: TempDir) {
    assert_eq!(
        knot_output(staged_repository_dir.path(), &["ls-files"]),
        "1.txt\na/2.txt\na/b/3.txt"
    );

    let index = std::fs::read(staged_repository_dir.child(".git/index").path()).unwrap();
    assert_eq!(&index[..4], b"DIRC");
    assert_eq!(&index[4..12], &[0, 0, 0, 2, 0, 0, 0, 3]);
}

#[rstest]
fn ls_files_with_stage_shows_mode_and_id(staged_repository_dir: TempDir) {
    let lines = knot_output(staged_repository_dir.path(), &["ls-files", "-s"]);

    assert_eq!(
        lines.lines().next().unwrap(),
        "100644 43dd47ea691c90a5fa7827892c70241913351963 0\t1.txt"
    );
}

#[rstest]
fn add_multiple_files_to_index_incrementally_successfully(init_repository_dir: TempDir) {
    let mut names = Vec::new();
    for index in 0..3 {
        let name = format!("{}-{index}.txt", Word().fake::<String>());
        init_repository_dir
            .child(&name)
            .write_str(&Words(3..8).fake::<Vec<String>>().join(" "))
            .unwrap();

        run_knot_command(init_repository_dir.path(), &["add", &name])
            .assert()
            .success();
        names.push(name);
    }

    names.sort();
    assert_eq!(
        knot_output(init_repository_dir.path(), &["ls-files"]),
        names.join("\n")
    );
}

#[rstest]
fn adding_the_same_content_twice_keeps_one_entry(init_repository_dir: TempDir) {
    init_repository_dir.child("a.txt").write_str("same").unwrap();

    for _ in 0..2 {
        run_knot_command(init_repository_dir.path(), &["add", "a.txt"])
            .assert()
            .success();
    }

    assert_eq!(knot_output(init_repository_dir.path(), &["ls-files"]), "a.txt");
}

#[rstest]
fn replace_file_with_directory_successfully(init_repository_dir: TempDir) {
    init_repository_dir.child("alice.txt").write_str("alice").unwrap();
    init_repository_dir.child("bob.txt").write_str("bob").unwrap();
    run_knot_command(init_repository_dir.path(), &["add", "."])
        .assert()
        .success();

    std::fs::remove_file(init_repository_dir.child("alice.txt").path()).unwrap();
    init_repository_dir.child("alice.txt/nested.txt").write_str("nested").unwrap();
    run_knot_command(init_repository_dir.path(), &["add", "."])
        .assert()
        .success();

    assert_eq!(
        knot_output(init_repository_dir.path(), &["ls-files"]),
        "alice.txt/nested.txt\nbob.txt"
    );
}

#[rstest]
fn replace_directory_having_nested_children_with_file_successfully(
    init_repository_dir: TempDir,
) {
    init_repository_dir.child("nested/bob.txt").write_str("bob").unwrap();
    init_repository_dir.child("nested/inner/claire.txt").write_str("claire").unwrap();
    run_knot_command(init_repository_dir.path(), &["add", "."])
        .assert()
        .success();

    std::fs::remove_dir_all(init_repository_dir.child("nested").path()).unwrap();
    init_repository_dir.child("nested").write_str("now a file").unwrap();
    run_knot_command(init_repository_dir.path(), &["add", "."])
        .assert()
        .success();

    assert_eq!(knot_output(init_repository_dir.path(), &["ls-files"]), "nested");
}

#[rstest]
fn removing_deleted_files_from_index_successfully(staged_repository_dir: TempDir) {
    std::fs::remove_file(staged_repository_dir.child("a/2.txt").path()).unwrap();

    run_knot_command(staged_repository_dir.path(), &["add", "a"])
        .assert()
        .success();

    assert_eq!(
        knot_output(staged_repository_dir.path(), &["ls-files"]),
        "1.txt\na/b/3.txt"
    );
}

#[rstest]
fn adding_a_non_existent_file_fails_and_leaves_index_unchanged(
    staged_repository_dir: TempDir,
) {
    let index_path = staged_repository_dir.child(".git/index");
    let before = std::fs::read(index_path.path()).unwrap();
    staged_repository_dir.child("new.txt").write_str("new").unwrap();

    run_knot_command(staged_repository_dir.path(), &["add", "new.txt", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not match any files"));

    let after = std::fs::read(index_path.path()).unwrap();
    assert_index_eq!(&after, &before);
    staged_repository_dir
        .child(".git/index.lock")
        .assert(predicate::path::missing());
}

#[cfg(unix)]
#[rstest]
fn adding_an_unreadable_file_fails_without_touching_the_index(init_repository_dir: TempDir) {
    use std::os::unix::fs::PermissionsExt;

    init_repository_dir.child("valid.txt").write_str("valid").unwrap();
    let unreadable = init_repository_dir.child("unreadable.txt");
    unreadable.write_str("secret").unwrap();
    std::fs::set_permissions(unreadable.path(), std::fs::Permissions::from_mode(0o000)).unwrap();

    // privileged users read through permission bits
    if std::fs::read(unreadable.path()).is_ok() {
        return;
    }

    run_knot_command(init_repository_dir.path(), &["add", "valid.txt", "unreadable.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Permission denied"));

    init_repository_dir
        .child(".git/index")
        .assert(predicate::path::missing());
}

#[rstest]
fn add_fails_while_the_index_is_locked(staged_repository_dir: TempDir) {
    let index_path = staged_repository_dir.child(".git/index");
    let before = std::fs::read(index_path.path()).unwrap();
    staged_repository_dir.child(".git/index.lock").touch().unwrap();
    staged_repository_dir.child("new.txt").write_str("new").unwrap();

    run_knot_command(staged_repository_dir.path(), &["add", "new.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("another process holds the lock"));

    // the foreign lock is not ours to remove
    staged_repository_dir
        .child(".git/index.lock")
        .assert(predicate::path::exists());
    let after = std::fs::read(index_path.path()).unwrap();
    assert_index_eq!(&after, &before);
}

#[rstest]
fn update_index_requires_add_for_new_files(init_repository_dir: TempDir) {
    init_repository_dir.child("a.txt").write_str("a").unwrap();

    run_knot_command(init_repository_dir.path(), &["update-index", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing --add option"));

    run_knot_command(init_repository_dir.path(), &["update-index", "--add", "a.txt"])
        .assert()
        .success();
    assert_eq!(knot_output(init_repository_dir.path(), &["ls-files"]), "a.txt");
}

#[rstest]
fn update_index_removes_deleted_files_only_when_asked(staged_repository_dir: TempDir) {
    std::fs::remove_file(staged_repository_dir.child("1.txt").path()).unwrap();

    run_knot_command(staged_repository_dir.path(), &["update-index", "1.txt"])
        .assert()
        .failure();
    run_knot_command(staged_repository_dir.path(), &["update-index", "--remove", "1.txt"])
        .assert()
        .success();

    assert_eq!(
        knot_output(staged_repository_dir.path(), &["ls-files"]),
        "a/2.txt\na/b/3.txt"
    );
}

#[rstest]
fn concurrent_add_operations_maintain_index_consistency(init_repository_dir: TempDir) {
    const WRITERS: usize = 4;

    for writer in 0..WRITERS {
        init_repository_dir
            .child(format!("file-{writer}.txt"))
            .write_str(&format!("content {writer}"))
            .unwrap();
    }

    let handles = (0..WRITERS)
        .map(|writer| {
            let dir = init_repository_dir.path().to_path_buf();
            std::thread::spawn(move || {
                let name = format!("file-{writer}.txt");
                // a writer that loses the lock race retries
                (0..200).any(|_| {
                    let succeeded = run_knot_command(&dir, &["add", &name])
                        .output()
                        .map(|output| output.status.success())
                        .unwrap_or(false);
                    if !succeeded {
                        std::thread::sleep(std::time::Duration::from_millis(10));
                    }
                    succeeded
                })
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert!(handle.join().unwrap(), "writer never acquired the index lock");
    }

    let expected = (0..WRITERS)
        .map(|writer| format!("file-{writer}.txt"))
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(knot_output(init_repository_dir.path(), &["ls-files"]), expected);
}

#[rstest]
fn index_records_file_modification_time(init_repository_dir: TempDir) {
    let file = init_repository_dir.child("pinned.txt");
    file.write_str("pinned").unwrap();
    filetime::set_file_mtime(file.path(), filetime::FileTime::from_unix_time(1_600_000_000, 0))
        .unwrap();

    run_knot_command(init_repository_dir.path(), &["add", "pinned.txt"])
        .assert()
        .success();

    // header, then ctime seconds and nanoseconds, then mtime seconds
    let index = std::fs::read(init_repository_dir.child(".git/index").path()).unwrap();
    assert_eq!(&index[20..24], &1_600_000_000u32.to_be_bytes());
}
