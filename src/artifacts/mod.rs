//! Value types and codecs
//!
//! - `core`: Hash kinds, configuration, atomic writes and lock files
//! - `database`: Tree entry type
//! - `index`: Index file format (header, entries, checksum)
//! - `objects`: Object kinds and their encodings
//! - `refs`: Ref names and revision expressions

pub mod core;
pub mod database;
pub mod index;
pub mod objects;
pub mod refs;
