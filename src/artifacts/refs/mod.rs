//! Reference names
//!
//! Tags and branches are files under `refs/`, so their names must be safe
//! path fragments and must not collide with the lock and revision syntax.

pub mod ref_name;
pub mod revision;

pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\/\/|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Matches the body of a symbolic ref file such as `HEAD`
pub const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const PARENT_REGEX: &str = r"^(.+)\^$";
pub const ANCESTOR_REGEX: &str = r"^(.+)\~(\d+)$";

/// Shorthand accepted for `HEAD`
pub const HEAD_ALIAS: &str = "@";
