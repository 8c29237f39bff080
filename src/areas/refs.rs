//! References (HEAD, branches, tags)
//!
//! References are human-readable names pointing at object ids. Each one is
//! a small text file under the repository directory:
//!
//! - `HEAD`: `ref: refs/heads/<branch>` (symbolic) or a bare id (detached)
//! - `refs/heads/<name>`: branch tip commit
//! - `refs/tags/<name>`: tagged object, either the target itself
//!   (lightweight) or a tag object describing it (annotated)
//!
//! ## File Format
//!
//! A direct reference holds the hex id followed by a newline; a symbolic
//! reference holds `ref: <path>`. Every write goes through a temporary file
//! and a rename, so readers see either the old or the new value.

use crate::areas::database::Database;
use crate::artifacts::core::fs::write_atomic;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::refs::SYMREF_REGEX;
use crate::artifacts::refs::ref_name::RefName;
use crate::errors::{StoreError, StoreResult};
use derive_new::new;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Branch HEAD points at in a fresh repository
pub const DEFAULT_BRANCH: &str = "master";

/// Symbolic refs are followed at most this many times
const MAX_SYMREF_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RefValue {
    /// Path of another ref, relative to the repository directory
    Symbolic(String),
    Direct(ObjectId),
}

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the repository directory (typically `.git`)
    path: Box<Path>,
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    pub fn tags_path(&self) -> PathBuf {
        self.refs_path().join("tags")
    }

    fn read_ref_file(path: &Path) -> StoreResult<Option<RefValue>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound || path.is_dir() => {
                return Ok(None);
            }
            Err(error) => return Err(StoreError::io(path)(error)),
        };
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref = regex::Regex::new(SYMREF_REGEX)
            .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        if let Some(captures) = symref.captures(content) {
            return Ok(Some(RefValue::Symbolic(captures[1].to_string())));
        }

        ObjectId::try_parse(content.to_string())
            .map(|oid| Some(RefValue::Direct(oid)))
            .map_err(|e| StoreError::corrupt(format!("ref {}", path.display()), e))
    }

    /// Follow symbolic refs from `start` to the file holding a direct id
    ///
    /// Returns that file's path (which may not exist yet, e.g. an unborn
    /// branch) and the id it holds, if any.
    fn follow(&self, start: PathBuf) -> StoreResult<(PathBuf, Option<ObjectId>)> {
        let mut path = start;

        for _ in 0..=MAX_SYMREF_DEPTH {
            match Self::read_ref_file(&path)? {
                Some(RefValue::Symbolic(target)) => path = self.path.join(target),
                Some(RefValue::Direct(oid)) => return Ok((path, Some(oid))),
                None => return Ok((path, None)),
            }
        }

        Err(StoreError::corrupt(
            "symbolic ref",
            format!("more than {MAX_SYMREF_DEPTH} levels of indirection"),
        ))
    }

    /// Point HEAD at `branch` (`ref: refs/heads/<branch>`)
    pub fn set_head(&self, branch: &str) -> StoreResult<()> {
        let branch = Self::parse_name(branch)?;
        write_atomic(
            &self.head_path(),
            format!("ref: refs/heads/{branch}\n").as_bytes(),
        )
    }

    /// The ref HEAD ultimately names, e.g. `refs/heads/master`, or `HEAD` when detached
    pub fn current_ref(&self) -> StoreResult<String> {
        let (path, _) = self.follow(self.head_path())?;

        Ok(path
            .strip_prefix(&self.path)
            .map(|relative| relative.to_string_lossy().to_string())
            .unwrap_or_else(|_| HEAD_REF_NAME.to_string()))
    }

    /// Commit HEAD resolves to, or `None` on an unborn branch
    pub fn read_head(&self) -> StoreResult<Option<ObjectId>> {
        self.follow(self.head_path()).map(|(_, oid)| oid)
    }

    /// Move the branch HEAD points at (or HEAD itself, when detached) to `oid`
    pub fn update_head(&self, oid: &ObjectId) -> StoreResult<()> {
        let (path, _) = self.follow(self.head_path())?;
        write_atomic(&path, format!("{oid}\n").as_bytes())
    }

    pub fn read_branch(&self, name: &str) -> StoreResult<Option<ObjectId>> {
        let name = Self::parse_name(name)?;
        self.follow(self.namespaced(&self.heads_path(), &name))
            .map(|(_, oid)| oid)
    }

    /// Point tag `name` directly at `target`
    ///
    /// Fails `NotFound` if `target` is not stored and `Conflict` if the tag
    /// exists and `force` is not set.
    pub fn create_lightweight(
        &self,
        database: &Database,
        name: &str,
        target: &ObjectId,
        force: bool,
    ) -> StoreResult<()> {
        let name = Self::parse_name(name)?;
        let tag_path = self.check_tag_slot(&name, force)?;

        if !database.exists(target) {
            return Err(StoreError::not_found("object", target));
        }

        write_atomic(&tag_path, format!("{target}\n").as_bytes())
    }

    /// Store a tag object describing `target` and point tag `name` at it
    ///
    /// Same existence and conflict rules as [`Refs::create_lightweight`];
    /// the conflict is checked before anything is written. Returns the id
    /// of the new tag object.
    pub fn create_annotated(
        &self,
        database: &Database,
        name: &str,
        target: &ObjectId,
        tagger: Author,
        message: &str,
        force: bool,
    ) -> StoreResult<ObjectId> {
        let name = Self::parse_name(name)?;
        let tag_path = self.check_tag_slot(&name, force)?;

        if !database.exists(target) {
            return Err(StoreError::not_found("object", target));
        }
        let target_type = database.object_type(target)?;

        let tag = Tag::new(
            target.clone(),
            target_type,
            name.to_string(),
            tagger,
            message.to_string(),
        );
        let tag_oid = database.store(&tag)?;

        write_atomic(&tag_path, format!("{tag_oid}\n").as_bytes())?;
        Ok(tag_oid)
    }

    /// Id stored under tag `name` (a tag object for annotated tags)
    pub fn resolve(&self, name: &str) -> StoreResult<ObjectId> {
        let name = Self::parse_name(name)?;

        match self.follow(self.namespaced(&self.tags_path(), &name))? {
            (_, Some(oid)) => Ok(oid),
            (_, None) => Err(StoreError::not_found("tag", &name)),
        }
    }

    /// All tag names, `/`-joined, in lexicographic order
    pub fn list(&self) -> StoreResult<Vec<String>> {
        Self::list_under(&self.tags_path())
    }

    /// All branch names, `/`-joined, in lexicographic order
    pub fn list_branches(&self) -> StoreResult<Vec<String>> {
        Self::list_under(&self.heads_path())
    }

    fn list_under(root: &Path) -> StoreResult<Vec<String>> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                StoreError::IoFailure {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            // skips lock files and interrupted atomic writes
            if RefName::try_parse(name.as_str()).is_ok() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Remove tag `name`, returning the id it held
    pub fn delete(&self, name: &str) -> StoreResult<ObjectId> {
        let oid = self.resolve(name)?;
        let name = Self::parse_name(name)?;
        let tag_path = self.namespaced(&self.tags_path(), &name);

        std::fs::remove_file(&tag_path).map_err(StoreError::io(&tag_path))?;
        self.prune_empty_parent_dirs(&tag_path)?;

        Ok(oid)
    }

    fn parse_name(name: &str) -> StoreResult<RefName> {
        RefName::try_parse(name).map_err(|e| StoreError::InvalidFormat(e.to_string()))
    }

    fn namespaced(&self, namespace: &Path, name: &RefName) -> PathBuf {
        name.components()
            .fold(namespace.to_path_buf(), |path, component| path.join(component))
    }

    /// Path for tag `name`, provided it is free (or `force` is set)
    ///
    /// A tag whose name is a prefix directory of the new one (or vice versa)
    /// can never be overwritten in place and is always a conflict.
    fn check_tag_slot(&self, name: &RefName, force: bool) -> StoreResult<PathBuf> {
        let tags_path = self.tags_path();
        let tag_path = self.namespaced(&tags_path, name);

        let mut prefix = tags_path.clone();
        let mut components = name.components().peekable();
        while let Some(component) = components.next() {
            prefix.push(component);
            if components.peek().is_some() && prefix.is_file() {
                return Err(StoreError::Conflict(format!(
                    "tag '{name}' (tag '{}' exists)",
                    prefix.strip_prefix(&tags_path).unwrap_or(prefix.as_path()).display()
                )));
            }
        }

        if tag_path.is_dir() {
            return Err(StoreError::Conflict(format!(
                "tag '{name}' (a tag directory of that name exists)"
            )));
        }
        if tag_path.exists() && !force {
            return Err(StoreError::Conflict(format!("tag '{name}'")));
        }

        Ok(tag_path)
    }

    fn prune_empty_parent_dirs(&self, path: &Path) -> StoreResult<()> {
        let tags_path = self.tags_path();
        let mut current = path.parent();

        while let Some(parent) = current
            && parent != tags_path
            && parent.starts_with(&tags_path)
        {
            let mut entries = parent.read_dir().map_err(StoreError::io(parent))?;
            if entries.next().is_some() {
                break;
            }

            std::fs::remove_dir(parent).map_err(StoreError::io(parent))?;
            current = parent.parent();
        }

        Ok(())
    }
}
