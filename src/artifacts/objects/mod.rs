//! Object types and operations
//!
//! All content is stored as objects identified by the digest of their
//! tagged encoding. There are four kinds:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//! - **Tag**: Annotated reference to another object
//!
//! All objects implement serialization/deserialization of their content;
//! the stored form is `<type> <size>\0<content>`.

pub mod blob;
pub mod commit;
pub mod headers;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;
