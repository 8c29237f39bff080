//! Core utilities and shared types
//!
//! This module contains the building blocks shared by every store:
//!
//! - `config`: Repository configuration loaded from the environment
//! - `fs`: Atomic temp-then-rename file writes
//! - `hash_kind`: The configurable digest used for object ids and checksums
//! - `lockfile`: Scoped sentinel lock with guaranteed release

pub mod config;
pub mod fs;
pub mod hash_kind;
pub mod lockfile;
