//! Typed failures surfaced by the storage core
//!
//! Every component (object database, index, tree builder, commit writer, refs)
//! reports failures through [`StoreError`]. Nothing in the core prints, logs,
//! retries or swallows an error; translating it into a user-facing message is
//! left to the command layer.

use std::path::{Path, PathBuf};

/// Failure taxonomy of the storage core
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An object, ref or referenced target is missing
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    /// Malformed input: bad signature or version, invalid name or path
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Stored bytes failed to decompress, parse or verify
    #[error("corrupt {what}: {reason}")]
    Corrupt { what: String, reason: String },

    /// A commit (or tree) references an id absent from the object database
    #[error("dangling reference: {kind} {oid} does not exist")]
    DanglingReference { kind: &'static str, oid: String },

    /// An id exists but names an object of the wrong kind
    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: String,
        expected: String,
        actual: String,
    },

    /// A ref with this name already exists and no override was requested
    #[error("{0} already exists")]
    Conflict(String),

    /// The sentinel lock file is held by another invocation
    #[error("unable to create '{}': another process holds the lock", path.display())]
    Locked { path: PathBuf },

    /// The underlying filesystem operation failed
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(kind: &'static str, name: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn corrupt(what: impl ToString, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build a closure wrapping an `io::Error` for `path`, for use with `map_err`
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::IoFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
