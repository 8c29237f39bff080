//! Index file format
//!
//! The index (also called staging area or cache) records which paths, with
//! which content ids, are slated for the next commit. It is a flat list of
//! leaf paths; directories are only implied by the paths.
//!
//! ## File Format (Version 2)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path):
//!   - Each entry padded with NUL bytes to 8-byte alignment
//!   - Contains stat metadata, content id, flags and path
//!
//! Checksum (20 or 32 bytes):
//!   - Digest of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12; // 4 bytes for marker, 4 for version, 4 for entries_count

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index file format version
pub const VERSION: u32 = 2;
