//! Repository components
//!
//! - `database`: Content-addressed object store
//! - `index`: Staging area with its lock file
//! - `refs`: HEAD, branch pointers and tags
//! - `tree_builder`: Index entries to stored trees
//! - `commit_writer`: Trees plus ancestry to stored commits
//! - `repository`: The context every command runs against
//! - `workspace`: Working directory access

pub mod commit_writer;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod tree_builder;
pub mod workspace;
