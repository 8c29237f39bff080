//! Plumbing commands
//!
//! ## Commands
//!
//! - `hash-object`: Compute a blob id and optionally store the blob
//! - `cat-file`: Print an object, its type or its size
//! - `ls-tree`: List the contents of a tree
//! - `ls-files`: List the staged paths
//! - `update-index`: Stage or unstage individual files
//! - `write-tree`: Store the tree of the current index
//! - `commit-tree`: Store a commit for an existing tree
//! - `rev-parse`: Resolve a revision to an object id
//! - `show-ref`: List branches and tags with their ids

pub mod cat_file;
pub mod commit_tree;
pub mod hash_object;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod show_ref;
pub mod update_index;
pub mod write_tree;
