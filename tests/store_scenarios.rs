//! End-to-end runs of the stores through the library API

use assert_fs::TempDir;
use knot::areas::commit_writer::CommitWriter;
use knot::areas::index::Index;
use knot::areas::repository::Repository;
use knot::areas::tree_builder::TreeBuilder;
use knot::artifacts::core::config::RepositoryConfig;
use knot::artifacts::core::hash_kind::HashKind;
use knot::artifacts::index::entry_mode::FileMode;
use knot::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use knot::artifacts::objects::commit::Author;
use knot::artifacts::objects::object_id::ObjectId;
use knot::artifacts::objects::object_type::ObjectType;
use knot::errors::StoreError;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

struct Fixture {
    _dir: TempDir,
    repository: Repository,
}

fn open(config: RepositoryConfig) -> Fixture {
    let dir = TempDir::new().unwrap();
    let repository =
        Repository::with_config(dir.path(), config, Box::new(std::io::sink())).unwrap();
    std::fs::create_dir_all(repository.refs().heads_path()).unwrap();
    std::fs::create_dir_all(repository.refs().tags_path()).unwrap();
    repository.refs().set_head("master").unwrap();

    Fixture {
        _dir: dir,
        repository,
    }
}

#[fixture]
fn store() -> Fixture {
    open(RepositoryConfig::default())
}

#[fixture]
fn author() -> Author {
    Author::try_from("Ann Author <ann@example.com> 1700000000 +0000").unwrap()
}

fn stage(repository: &Repository, index: &mut Index, name: &str, content: &[u8]) -> ObjectId {
    let oid = repository
        .database()
        .write(ObjectType::Blob, content)
        .unwrap();
    let metadata = EntryMetadata::for_file(FileMode::Regular, content.len() as u64, 1_700_000_000);
    index
        .upsert(IndexEntry::new(name.to_string(), oid.clone(), metadata))
        .unwrap();
    oid
}

#[rstest]
#[tokio::test]
async fn blob_tree_commit_and_tag(store: Fixture, author: Author) {
    let repository = &store.repository;
    let index = repository.index();
    let mut index = index.lock().await;

    let mut staged = index.lock_for_update().unwrap();
    let blob = stage(repository, &mut staged, "a.txt", b"hello");
    staged.save().unwrap();
    assert_eq!(blob.as_ref(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");

    index.load().unwrap();
    let tree = TreeBuilder::new(repository.database())
        .build(index.entries())
        .unwrap();
    assert_eq!(tree.as_ref(), "65829399355e5929e44741d637d52c614ac21bc3");

    let commit = CommitWriter::new(repository.database())
        .create(&tree, &[], author.clone(), author, "initial\n")
        .unwrap();
    assert_eq!(commit.as_ref(), "ac349976631c780dd5538b9327b7f24d169b63e1");

    repository
        .refs()
        .create_lightweight(repository.database(), "v1", &commit, false)
        .unwrap();
    assert_eq!(repository.refs().resolve("v1").unwrap(), commit);
    assert_eq!(repository.refs().list().unwrap(), vec!["v1".to_string()]);
}

#[rstest]
#[tokio::test]
async fn nested_directory_gets_its_own_tree(store: Fixture) {
    let repository = &store.repository;
    let index = repository.index();
    let mut index = index.lock().await;

    let mut staged = index.lock_for_update().unwrap();
    // staged out of order on purpose
    stage(repository, &mut staged, "dir/b", b"B");
    stage(repository, &mut staged, "dir/a", b"A");
    staged.save().unwrap();

    index.load().unwrap();
    let names = index
        .entries()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["dir/a", "dir/b"]);

    let root = TreeBuilder::new(repository.database())
        .build(index.entries())
        .unwrap();
    assert_eq!(root.as_ref(), "c36b8889d39a0cf59ecfa3b2813ce55df6ee9afe");

    let root_tree = repository.database().parse_object_as_tree(&root).unwrap();
    let dir = root_tree.get("dir").unwrap();
    assert!(dir.is_tree());
    assert_eq!(dir.oid.as_ref(), "a8d705f02f6f3fde0476c946f5f22cc5fb58238c");
}

#[rstest]
fn second_index_writer_is_locked_out(store: Fixture) {
    let path = store.repository.git_path().join("index");
    let mut first = Index::new(path.clone().into_boxed_path(), HashKind::Sha1);
    let mut second = Index::new(path.into_boxed_path(), HashKind::Sha1);

    let held = first.lock_for_update().unwrap();
    assert!(matches!(
        second.lock_for_update(),
        Err(StoreError::Locked { .. })
    ));

    drop(held);
    assert!(second.lock_for_update().is_ok());
}

#[rstest]
fn annotated_tag_conflict_writes_nothing(store: Fixture, author: Author) {
    let repository = &store.repository;
    let blob = repository
        .database()
        .write(ObjectType::Blob, b"hello")
        .unwrap();
    repository
        .refs()
        .create_lightweight(repository.database(), "v1", &blob, false)
        .unwrap();

    let result = repository.refs().create_annotated(
        repository.database(),
        "v1",
        &blob,
        author,
        "again\n",
        false,
    );

    assert!(matches!(result, Err(StoreError::Conflict(_))));
    assert_eq!(repository.refs().resolve("v1").unwrap(), blob);
    let tag_objects = repository
        .database()
        .find_objects_by_prefix("")
        .unwrap()
        .into_iter()
        .filter(|oid| repository.database().object_type(oid).unwrap() == ObjectType::Tag)
        .count();
    assert_eq!(tag_objects, 0);
}

#[rstest]
#[tokio::test]
async fn sha256_repository_round_trips(author: Author) {
    let store = open(RepositoryConfig::default().with_hash(HashKind::Sha256));
    let repository = &store.repository;
    let index = repository.index();
    let mut index = index.lock().await;

    let mut staged = index.lock_for_update().unwrap();
    stage(repository, &mut staged, "a.txt", b"hello");
    staged.save().unwrap();

    index.load().unwrap();
    let tree = TreeBuilder::new(repository.database())
        .build(index.entries())
        .unwrap();
    let commit = CommitWriter::new(repository.database())
        .create(&tree, &[], author.clone(), author, "initial\n")
        .unwrap();

    assert_eq!(commit.as_ref().len(), 64);
    assert_eq!(
        repository.database().parse_object_as_commit(&commit).unwrap().tree_oid(),
        &tree
    );
}

#[tokio::test]
async fn reopening_with_another_digest_is_invalid_format() {
    let dir = TempDir::new().unwrap();
    let sha256 = RepositoryConfig::default().with_hash(HashKind::Sha256);

    let mut repository =
        Repository::with_config(dir.path(), sha256, Box::new(std::io::sink())).unwrap();
    repository.init().await.unwrap();
    drop(repository);

    let error = Repository::with_config(
        dir.path(),
        RepositoryConfig::default(),
        Box::new(std::io::sink()),
    )
    .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<StoreError>(),
        Some(StoreError::InvalidFormat(_))
    ));
    assert!(Repository::with_config(dir.path(), sha256, Box::new(std::io::sink())).is_ok());
}
