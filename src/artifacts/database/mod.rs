//! Tree entry type
//!
//! A `DatabaseEntry` is what a tree stores per child: the child's id and
//! the mode it was recorded with (file, executable, symlink or directory).

pub mod database_entry;
