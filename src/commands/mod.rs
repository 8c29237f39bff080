//! Command implementations, written as `impl Repository` blocks
//!
//! - `plumbing`: object-level commands (hash-object, cat-file, write-tree, ...)
//! - `porcelain`: user-facing workflows (init, add, commit, tag)
//!
//! Commands print through the repository writer and report failures as
//! `anyhow` errors carrying the underlying store error.

pub mod plumbing;
pub mod porcelain;
