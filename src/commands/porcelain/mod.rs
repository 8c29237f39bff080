//! Porcelain commands
//!
//! ## Commands
//!
//! - `init`: Create the repository layout
//! - `add`: Stage files and directories
//! - `commit`: Commit the index on top of HEAD
//! - `tag`: Create, list, or delete tags

pub mod add;
pub mod commit;
pub mod init;
pub mod tag;
