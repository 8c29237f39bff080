//! Tree construction from staged entries
//!
//! The index only records leaf paths. Building a snapshot groups them by
//! directory, then stores trees deepest-first so each child id is known
//! before its parent is serialized. The pass is a loop over the directory
//! table, never recursion, so nesting depth does not grow the stack.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{StoreError, StoreResult};
use std::collections::{BTreeMap, BTreeSet};

/// Directory path (`""` for the root) to the tree being assembled for it
type DirectoryTable = BTreeMap<String, Tree>;

#[derive(Debug)]
pub struct TreeBuilder<'d> {
    database: &'d Database,
}

impl<'d> TreeBuilder<'d> {
    pub fn new(database: &'d Database) -> Self {
        TreeBuilder { database }
    }

    /// Store one tree per directory implied by `entries` and return the root id
    ///
    /// The input order is irrelevant. Fails `InvalidFormat` on duplicate
    /// paths, on a path used both as a file and as a directory and on
    /// unmerged (stage > 0) entries, and `DanglingReference` when a staged
    /// blob is missing from the database. No entries yields the empty tree.
    pub fn build(&self, entries: &[IndexEntry]) -> StoreResult<ObjectId> {
        let mut sorted = entries.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        self.validate(&sorted)?;
        let mut directories = Self::group_by_directory(&sorted)?;

        // deepest directories first; the root ("") has depth zero and comes last
        let mut paths = directories.keys().cloned().collect::<Vec<_>>();
        paths.sort_by_key(|path| std::cmp::Reverse(Self::depth(path)));

        for path in paths.iter().filter(|path| !path.is_empty()) {
            let tree = directories.remove(path).unwrap_or_default();
            let oid = self.database.store(&tree)?;

            let (parent, name) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
            directories
                .entry(parent.to_string())
                .or_default()
                .insert(name, DatabaseEntry::new(oid, EntryMode::Directory))
                .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        }

        let root = directories.remove("").unwrap_or_default();
        self.database.store(&root)
    }

    fn validate(&self, sorted: &[&IndexEntry]) -> StoreResult<()> {
        for pair in sorted.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(StoreError::InvalidFormat(format!(
                    "path {} is staged more than once",
                    pair[0].name
                )));
            }
        }

        let directories = sorted
            .iter()
            .flat_map(|entry| entry.parent_dirs())
            .collect::<BTreeSet<_>>();

        for entry in sorted {
            if entry.stage() != 0 {
                return Err(StoreError::InvalidFormat(format!(
                    "{} is unmerged (stage {})",
                    entry.name,
                    entry.stage()
                )));
            }
            if entry.metadata.mode.is_tree() {
                return Err(StoreError::InvalidFormat(format!(
                    "{} is staged as a directory",
                    entry.name
                )));
            }
            if directories.contains(entry.name.as_str()) {
                return Err(StoreError::InvalidFormat(format!(
                    "{} is staged both as a file and as a directory",
                    entry.name
                )));
            }
            if !self.database.exists(&entry.oid) {
                return Err(StoreError::DanglingReference {
                    kind: "blob",
                    oid: entry.oid.to_string(),
                });
            }
        }

        Ok(())
    }

    fn group_by_directory(sorted: &[&IndexEntry]) -> StoreResult<DirectoryTable> {
        let mut directories = DirectoryTable::new();
        directories.insert(String::new(), Tree::default());

        for entry in sorted {
            for dir in entry.parent_dirs() {
                directories.entry(dir.to_string()).or_default();
            }

            let parent = entry
                .name
                .rsplit_once('/')
                .map(|(parent, _)| parent)
                .unwrap_or("");
            directories
                .entry(parent.to_string())
                .or_default()
                .insert(
                    entry.basename(),
                    DatabaseEntry::new(entry.oid.clone(), entry.metadata.mode),
                )
                .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        }

        Ok(directories)
    }

    fn depth(path: &str) -> usize {
        if path.is_empty() {
            0
        } else {
            path.matches('/').count() + 1
        }
    }
}
