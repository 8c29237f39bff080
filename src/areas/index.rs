//! Index (staging area)
//!
//! The index tracks which paths, with which content ids, go into the next
//! commit. It holds leaf paths only; directories are implied by the paths
//! and reconstructed by the tree builder.
//!
//! ## Index File Format
//!
//! The index file contains:
//! - Header: signature, version and entry count
//! - Entries: path-sorted records with stat metadata and content id
//! - Checksum: digest of everything before it, for integrity verification
//!
//! ## Locking
//!
//! Reading needs no lock. Modifying the file goes through [`IndexLock`],
//! which claims the `index.lock` sentinel, reloads the current state, and
//! renames the re-serialized index over the old one on [`IndexLock::save`].
//! A second writer fails with `Locked` instead of waiting.

use crate::artifacts::core::hash_kind::HashKind;
use crate::artifacts::core::lockfile::Lockfile;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    ENTRY_BLOCK, IndexEntry, MAX_STAGE, entry_min_size, is_valid_index_path,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::{StoreError, StoreResult};
use std::io::{BufReader, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// In-memory view of the index file
///
/// Entries are kept sorted by path (then stage) at all times.
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    /// Digest used for content ids and the trailing checksum
    hash: HashKind,
    /// Staged entries in path order
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new(path: Box<Path>, hash: HashKind) -> Self {
        Index {
            path,
            hash,
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<IndexEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` is a staged file or a directory containing staged files
    pub fn is_tracked(&self, path: &str) -> bool {
        let dir_prefix = format!("{path}/");
        self.entries
            .iter()
            .any(|entry| entry.name == path || entry.name.starts_with(&dir_prefix))
    }

    /// Replace the in-memory state with the contents of the index file
    ///
    /// An absent or zero-length file is an empty index. A foreign signature
    /// or version fails `InvalidFormat`; truncated data, undecodable entries
    /// and a checksum mismatch fail `Corrupt`.
    pub fn load(&mut self) -> StoreResult<()> {
        self.entries.clear();

        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(StoreError::io(&self.path)(error)),
        };

        // if the index file is empty, return early
        let length = file.metadata().map_err(StoreError::io(&self.path))?.len();
        if length == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(BufReader::new(file), self.hash);
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader.verify()
    }

    /// Claim the index lock and reload the file under it
    pub fn lock_for_update(&mut self) -> StoreResult<IndexLock<'_>> {
        let lockfile = Lockfile::acquire(&self.path)?;
        self.load()?;

        Ok(IndexLock {
            index: self,
            lockfile,
        })
    }

    fn parse_header<R: std::io::Read>(&self, reader: &mut Checksum<R>) -> StoreResult<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(&header_bytes[..], self.hash)
            .map_err(|e| StoreError::corrupt("index", e))?;

        if header.marker != SIGNATURE {
            return Err(StoreError::InvalidFormat(format!(
                "invalid index signature {:?}",
                header.marker
            )));
        }

        if header.version != VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "unsupported index version {}",
                header.version
            )));
        }

        Ok(header.entries_count)
    }

    /// Parse all entries from the index file
    ///
    /// Reads each entry, handling variable-length paths with 8-byte alignment:
    /// an entry ends with the first block whose last byte is NUL.
    fn parse_entries<R: std::io::Read>(
        &mut self,
        entries_count: u32,
        reader: &mut Checksum<R>,
    ) -> StoreResult<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(entry_min_size(self.hash))?.to_vec();

            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(entry_bytes.as_slice(), self.hash)
                .map_err(|e| StoreError::corrupt("index entry", e))?;

            if let Some(previous) = self.entries.last()
                && previous >= &entry
            {
                return Err(StoreError::corrupt(
                    "index",
                    format!("entry {} is out of order", entry.name),
                ));
            }
            self.entries.push(entry);
        }

        Ok(())
    }

    /// Insert `entry`, or replace the entry already staged at its path
    ///
    /// Staging `a/b` discards a staged file `a`, and staging `a` discards
    /// everything under `a/`. A merged (stage 0) entry also discards the
    /// conflict stages of its path.
    pub fn upsert(&mut self, entry: IndexEntry) -> StoreResult<()> {
        if !is_valid_index_path(&entry.name) {
            return Err(StoreError::InvalidFormat(format!(
                "invalid index path {:?}",
                entry.name
            )));
        }
        if entry.oid.hash_kind() != self.hash {
            return Err(StoreError::InvalidFormat(format!(
                "{} is not a {} object id",
                entry.oid, self.hash
            )));
        }
        if entry.stage() > MAX_STAGE {
            return Err(StoreError::InvalidFormat(format!(
                "invalid stage {} for {}",
                entry.stage(),
                entry.name
            )));
        }

        self.discard_conflicts(&entry);

        match self.entries.binary_search(&entry) {
            Ok(position) => self.entries[position] = entry,
            Err(position) => self.entries.insert(position, entry),
        }

        Ok(())
    }

    /// Drop every stage of `path`; returns whether anything was staged there
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != path);

        self.entries.len() != before
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        let parents = entry.parent_dirs();
        let dir_prefix = format!("{}/", entry.name);
        let merged = entry.stage() == 0;

        self.entries.retain(|existing| {
            let same_path = existing.name == entry.name;
            !(parents.contains(&existing.name.as_str())
                || existing.name.starts_with(&dir_prefix)
                || (same_path && merged != (existing.stage() == 0)))
        });
    }

    fn encode(&self) -> StoreResult<Vec<u8>> {
        let invalid = |e: anyhow::Error| StoreError::InvalidFormat(e.to_string());
        let io_failure = StoreError::io(&self.path);
        let mut writer = Checksum::new(Vec::new(), self.hash);

        let header = IndexHeader::new(
            String::from(SIGNATURE),
            VERSION,
            self.entries.len() as u32,
        );
        let mut content = header.serialize().map_err(invalid)?.to_vec();
        for entry in &self.entries {
            content.extend_from_slice(&entry.serialize().map_err(invalid)?);
        }

        writer
            .write(&content)
            .and_then(|_| writer.write_checksum())
            .map_err(io_failure)?;

        Ok(writer.into_inner())
    }
}

/// Exclusive, scoped access to the index file
///
/// Holds `index.lock` for as long as it lives. [`IndexLock::save`] publishes
/// the in-memory entries; dropping the guard without saving releases the
/// lock and leaves the file on disk as it was.
#[derive(Debug)]
pub struct IndexLock<'a> {
    index: &'a mut Index,
    lockfile: Lockfile,
}

impl IndexLock<'_> {
    /// Re-serialize all entries with a fresh checksum and rename them into place
    pub fn save(self) -> StoreResult<()> {
        let bytes = self.index.encode()?;
        let IndexLock { mut lockfile, .. } = self;

        let lock_path = lockfile.lock_path().to_path_buf();
        lockfile
            .write_all(&bytes)
            .map_err(StoreError::io(&lock_path))?;

        lockfile.commit()
    }
}

impl Deref for IndexLock<'_> {
    type Target = Index;

    fn deref(&self) -> &Self::Target {
        self.index
    }
}

impl DerefMut for IndexLock<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.index
    }
}
