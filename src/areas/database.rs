//! Object database
//!
//! Content-addressed storage for blobs, trees, commits and tags. Every object
//! lives in its own zlib-compressed file at `objects/<fan-out>/<rest-of-id>`,
//! where the id is the digest of the uncompressed `<type> <size>\0<content>`
//! encoding.
//!
//! Writes are idempotent and atomic (temp file in the target directory, then
//! rename), so concurrent writers need no locking: writers of the same id
//! produce identical bytes, writers of different ids touch disjoint paths.

use crate::artifacts::core::config::RepositoryConfig;
use crate::artifacts::core::fs::write_atomic;
use crate::artifacts::core::hash_kind::HashKind;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, encode_object, object_id_for};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{StoreError, StoreResult};
use bytes::Bytes;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    config: RepositoryConfig,
}

impl Database {
    pub fn new(path: Box<Path>, config: RepositoryConfig) -> Self {
        Database { path, config }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn hash_kind(&self) -> HashKind {
        self.config.hash
    }

    /// On-disk location of an object, whether or not it exists
    pub fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path(self.config.fan_out))
    }

    /// Content address of `(object_type, content)` without storing anything
    pub fn hash(&self, object_type: ObjectType, content: &[u8]) -> StoreResult<ObjectId> {
        object_id_for(self.config.hash, object_type, content)
            .map_err(|e| StoreError::InvalidFormat(e.to_string()))
    }

    /// Persist `(object_type, content)` and return its id
    ///
    /// A no-op when an object with the same id is already present.
    pub fn write(&self, object_type: ObjectType, content: &[u8]) -> StoreResult<ObjectId> {
        let object_id = self.hash(object_type, content)?;
        let object_path = self.object_path(&object_id);

        // write the object to disk unless it already exists
        if !object_path.exists() {
            let compressed = Self::compress(&encode_object(object_type, content))
                .map_err(StoreError::io(&object_path))?;
            write_atomic(&object_path, &compressed)?;
        }

        Ok(object_id)
    }

    pub fn store(&self, object: &impl Object) -> StoreResult<ObjectId> {
        let content = object
            .serialize()
            .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;

        self.write(object.object_type(), &content)
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        object_id.hash_kind() == self.config.hash && self.object_path(object_id).is_file()
    }

    /// Load an object's type and content
    ///
    /// Fails `NotFound` when nothing is stored under the id and `Corrupt` when
    /// the file cannot be decompressed, its header is malformed, its length
    /// disagrees with the header or (when verification is enabled) its
    /// content no longer hashes to the id.
    pub fn read(&self, object_id: &ObjectId) -> StoreResult<(ObjectType, Bytes)> {
        let raw = self.read_object(object_id)?;
        let corrupt = |reason: String| StoreError::corrupt(format!("object {object_id}"), reason);

        let decompressed = Self::decompress(&raw).map_err(|e| corrupt(e.to_string()))?;
        let mut reader = Cursor::new(decompressed);
        let (object_type, size) =
            ObjectType::parse_object_header(&mut reader).map_err(|e| corrupt(e.to_string()))?;

        let header_len = reader.position() as usize;
        let content = reader.into_inner().slice(header_len..);
        if content.len() != size {
            return Err(corrupt(format!(
                "header declares {size} bytes, found {}",
                content.len()
            )));
        }

        if self.config.verify_on_read {
            let actual = self.hash(object_type, &content)?;
            if &actual != object_id {
                return Err(corrupt(format!("content hashes to {actual}")));
            }
        }

        Ok((object_type, content))
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> StoreResult<ObjectBox> {
        let (object_type, content) = self.read(object_id)?;

        ObjectBox::parse(object_type, &content, self.config.hash)
            .map_err(|e| StoreError::corrupt(format!("{object_type} {object_id}"), e))
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> StoreResult<Blob> {
        match self.parse_object(object_id)? {
            ObjectBox::Blob(blob) => Ok(*blob),
            other => Err(Self::mismatch(object_id, ObjectType::Blob, other.object_type())),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> StoreResult<Tree> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            other => Err(Self::mismatch(object_id, ObjectType::Tree, other.object_type())),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> StoreResult<Commit> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(*commit),
            other => Err(Self::mismatch(object_id, ObjectType::Commit, other.object_type())),
        }
    }

    pub fn parse_object_as_tag(&self, object_id: &ObjectId) -> StoreResult<Tag> {
        match self.parse_object(object_id)? {
            ObjectBox::Tag(tag) => Ok(*tag),
            other => Err(Self::mismatch(object_id, ObjectType::Tag, other.object_type())),
        }
    }

    /// Get the type of an object by decompressing only its header
    pub fn object_type(&self, object_id: &ObjectId) -> StoreResult<ObjectType> {
        let raw = self.read_object(object_id)?;
        let mut reader = BufReader::new(flate2::read::ZlibDecoder::new(raw.as_ref()));

        ObjectType::parse_object_header(&mut reader)
            .map(|(object_type, _)| object_type)
            .map_err(|e| StoreError::corrupt(format!("object {object_id}"), e))
    }

    fn mismatch(object_id: &ObjectId, expected: ObjectType, actual: ObjectType) -> StoreError {
        StoreError::TypeMismatch {
            oid: object_id.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    fn read_object(&self, object_id: &ObjectId) -> StoreResult<Bytes> {
        if object_id.hash_kind() != self.config.hash {
            return Err(StoreError::InvalidFormat(format!(
                "{object_id} is not a {} object id",
                self.config.hash
            )));
        }

        let object_path = self.object_path(object_id);
        match std::fs::read(&object_path) {
            Ok(content) => Ok(Bytes::from(content)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found("object", object_id))
            }
            Err(error) => Err(StoreError::io(&object_path)(error)),
        }
    }

    fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }

    /// Find all objects whose id starts with the given hex prefix.
    ///
    /// Used to resolve abbreviated ids. Several matches mean the prefix is
    /// ambiguous; no match yields an empty vector. Prefixes at least as long
    /// as the fan-out only scan one directory.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if !prefix.chars().all(|c| c.is_ascii_hexdigit()) || !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let fan_out = self.config.fan_out;
        let mut matches = Vec::new();

        for dir in std::fs::read_dir(&self.path).map_err(StoreError::io(&self.path))? {
            let dir = dir.map_err(StoreError::io(&self.path))?;
            let dir_name = dir.file_name().to_string_lossy().to_string();
            let shared = prefix.len().min(fan_out);
            if dir_name.len() != fan_out || dir_name[..shared] != prefix[..shared] {
                continue;
            }

            let dir_path = dir.path();
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path).map_err(StoreError::io(&dir_path))? {
                let entry = entry.map_err(StoreError::io(&dir_path))?;
                let full_oid = format!("{}{}", dir_name, entry.file_name().to_string_lossy());

                if full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::try_parse(full_oid)
                    && oid.hash_kind() == self.config.hash
                {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Author;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Fixture {
        _dir: TempDir,
        database: Database,
    }

    fn open(config: RepositoryConfig) -> Fixture {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path(), config);
        Fixture {
            _dir: dir,
            database,
        }
    }

    #[fixture]
    fn store() -> Fixture {
        open(RepositoryConfig::default())
    }

    #[rstest]
    fn write_then_read_returns_type_and_content(store: Fixture) {
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();

        assert_eq!(oid.as_ref(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert!(store.database.exists(&oid));
        assert!(
            store
                .database
                .objects_path()
                .join("b6")
                .join("fc4c620b67d95f953a5c1c1230aaab5db5a1b0")
                .is_file()
        );
        let (object_type, content) = store.database.read(&oid).unwrap();
        assert_eq!(object_type, ObjectType::Blob);
        assert_eq!(content, Bytes::from_static(b"hello"));
    }

    #[rstest]
    fn repeated_writes_are_idempotent(store: Fixture) {
        let first = store.database.write(ObjectType::Blob, b"same").unwrap();
        let modified = std::fs::metadata(store.database.object_path(&first))
            .unwrap()
            .modified()
            .unwrap();

        let second = store.database.write(ObjectType::Blob, b"same").unwrap();

        assert_eq!(first, second);
        let dir = store.database.object_path(&first).parent().unwrap().to_path_buf();
        assert_eq!(std::fs::read_dir(dir).unwrap().count(), 1);
        let after = std::fs::metadata(store.database.object_path(&first))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(modified, after);
    }

    #[rstest]
    fn missing_object_is_not_found(store: Fixture) {
        let oid = ObjectId::try_parse("0".repeat(40)).unwrap();

        assert!(!store.database.exists(&oid));
        assert!(matches!(store.database.read(&oid), Err(StoreError::NotFound { .. })));
    }

    #[rstest]
    fn garbage_on_disk_is_corrupt(store: Fixture) {
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();
        std::fs::write(store.database.object_path(&oid), b"not zlib at all").unwrap();

        assert!(matches!(store.database.read(&oid), Err(StoreError::Corrupt { .. })));
    }

    #[rstest]
    fn swapped_content_fails_verification(store: Fixture) {
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();
        let other = store.database.write(ObjectType::Blob, b"jello").unwrap();
        std::fs::copy(
            store.database.object_path(&other),
            store.database.object_path(&oid),
        )
        .unwrap();

        assert!(matches!(store.database.read(&oid), Err(StoreError::Corrupt { .. })));
    }

    #[rstest]
    fn wrong_length_header_is_corrupt(store: Fixture) {
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();
        let tampered = Database::compress(b"blob 9\0hello").unwrap();
        std::fs::write(store.database.object_path(&oid), tampered).unwrap();

        assert!(matches!(store.database.read(&oid), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn unverified_reads_skip_rehashing() {
        let store = open(RepositoryConfig {
            verify_on_read: false,
            ..Default::default()
        });
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();
        let other = store.database.write(ObjectType::Blob, b"jello").unwrap();
        std::fs::copy(
            store.database.object_path(&other),
            store.database.object_path(&oid),
        )
        .unwrap();

        let (_, content) = store.database.read(&oid).unwrap();
        assert_eq!(content, Bytes::from_static(b"jello"));
    }

    #[test]
    fn sha256_ids_are_64_characters() {
        let store = open(RepositoryConfig::default().with_hash(HashKind::Sha256));
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();

        assert_eq!(oid.as_ref().len(), 64);
        assert_eq!(store.database.read(&oid).unwrap().1, Bytes::from_static(b"hello"));
    }

    #[rstest]
    fn typed_parsing_reports_mismatches(store: Fixture) {
        let author = Author::try_from("A <a@x> 1 +0000").unwrap();
        let tree = store.database.store(&Tree::default()).unwrap();
        let commit = Commit::new(vec![], tree.clone(), author.clone(), author, "m".to_string());
        let commit_oid = store.database.store(&commit).unwrap();

        assert_eq!(store.database.parse_object_as_commit(&commit_oid).unwrap(), commit);
        assert_eq!(store.database.object_type(&tree).unwrap(), ObjectType::Tree);
        assert!(matches!(
            store.database.parse_object_as_commit(&tree),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[rstest]
    fn finds_objects_by_prefix(store: Fixture) {
        let oid = store.database.write(ObjectType::Blob, b"hello").unwrap();
        store.database.write(ObjectType::Blob, b"other").unwrap();

        assert_eq!(store.database.find_objects_by_prefix("b6fc").unwrap(), vec![oid.clone()]);
        assert_eq!(store.database.find_objects_by_prefix("b").unwrap().len(), 1);
        assert!(store.database.find_objects_by_prefix("xyz").unwrap().is_empty());
    }
}
