//! A small content-addressed version-control store
//!
//! `areas` holds the stores a repository is made of (objects, index, refs,
//! workspace) plus the tree and commit writers; `artifacts` holds the value
//! types and codecs they exchange; `commands` drives them from the CLI.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
