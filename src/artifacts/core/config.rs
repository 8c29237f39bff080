//! Repository configuration
//!
//! Settings are read from the environment, following the same convention as
//! the author identity (`GIT_AUTHOR_*`):
//!
//! - `KNOT_OBJECT_FORMAT`: `sha1` (default) or `sha256`
//! - `KNOT_VERIFY_OBJECTS`: `0`/`false` disables re-hashing objects on read
//!
//! The object format is also recorded in `.git/config` when a repository is
//! initialized. The recorded format wins over an unset variable, and a
//! variable that disagrees with it is rejected.

use crate::artifacts::core::hash_kind::HashKind;
use crate::errors::{StoreError, StoreResult};
use anyhow::Context;
use std::path::Path;

pub const OBJECT_FORMAT_VAR: &str = "KNOT_OBJECT_FORMAT";
pub const VERIFY_OBJECTS_VAR: &str = "KNOT_VERIFY_OBJECTS";

/// Name of the settings file inside the repository directory
pub const CONFIG_FILE: &str = "config";

/// Number of leading hex characters used as the object sub-directory
pub const DEFAULT_FAN_OUT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Digest used for object ids and the index checksum
    pub hash: HashKind,
    /// Re-derive the id of every object read and reject mismatches
    pub verify_on_read: bool,
    /// Hex characters of the id used as the object directory name
    pub fan_out: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            hash: HashKind::default(),
            verify_on_read: true,
            fan_out: DEFAULT_FAN_OUT,
        }
    }
}

impl RepositoryConfig {
    /// Settings for the repository at `git_path`, from the process environment
    pub fn load_from_env(git_path: &Path) -> anyhow::Result<Self> {
        Self::load_for_repository(git_path, |key| std::env::var(key).ok())
    }

    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(format) = lookup(OBJECT_FORMAT_VAR) {
            config.hash = format
                .parse()
                .with_context(|| format!("{OBJECT_FORMAT_VAR} has an invalid value"))?;
        }

        if let Some(verify) = lookup(VERIFY_OBJECTS_VAR) {
            config.verify_on_read = match verify.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => anyhow::bail!("{VERIFY_OBJECTS_VAR} has an invalid value: {other}"),
            };
        }

        Ok(config)
    }

    /// Like [`RepositoryConfig::load_from`], but an unset object format
    /// falls back to the one recorded in `git_path`
    pub fn load_for_repository(
        git_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = Self::load_from(&lookup)?;

        if lookup(OBJECT_FORMAT_VAR).is_none()
            && let Some(stored) = Self::read_object_format(git_path)?
        {
            config.hash = stored;
        }

        Ok(config)
    }

    pub fn with_hash(self, hash: HashKind) -> Self {
        RepositoryConfig { hash, ..self }
    }

    /// Object format recorded in `<git_path>/config`, `None` before `init`
    ///
    /// A config without an `extensions.objectformat` key is a SHA-1 repository.
    pub fn read_object_format(git_path: &Path) -> StoreResult<Option<HashKind>> {
        let path = git_path.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(StoreError::io(&path)(error)),
        };

        let mut section = String::new();
        let mut hash = HashKind::Sha1;

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                section = name.trim().to_ascii_lowercase();
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                StoreError::corrupt(path.display(), format!("malformed line '{line}'"))
            })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match (section.as_str(), key.as_str()) {
                ("core", "repositoryformatversion") => {
                    if !matches!(value, "0" | "1") {
                        return Err(StoreError::InvalidFormat(format!(
                            "unsupported repositoryformatversion {value}"
                        )));
                    }
                }
                ("extensions", "objectformat") => {
                    hash = value
                        .parse()
                        .map_err(|e: anyhow::Error| StoreError::InvalidFormat(e.to_string()))?;
                }
                _ => {}
            }
        }

        Ok(Some(hash))
    }

    /// The `.git/config` text recording this object format
    pub fn render(&self) -> String {
        match self.hash {
            HashKind::Sha1 => "[core]\n\trepositoryformatversion = 0\n".to_string(),
            hash => format!(
                "[core]\n\trepositoryformatversion = 1\n[extensions]\n\tobjectformat = {hash}\n"
            ),
        }
    }
}
