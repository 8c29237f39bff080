//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path (relative, `/`-separated)
//! - Content id of the staged blob
//! - Stat metadata (mode, size, timestamps) and flags (including the merge stage)
//!
//! ## Entry Format
//!
//! Fixed-width big-endian fields, the raw content id, a 16-bit flags word,
//! the path, and NUL padding up to the next multiple of 8 bytes (always at
//! least one NUL). The flags word packs assume-valid (bit 15), extended
//! (bit 14), the stage (bits 12-13) and the path length capped at 0xFFF.

use crate::artifacts::core::hash_kind::HashKind;
use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::fs::Metadata;
use std::io::{BufRead, Read, Write};
use std::os::unix::prelude::MetadataExt;

/// Maximum path length representable in the flags word
const MAX_PATH_SIZE: usize = 0xFFF;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Ten 32-bit stat fields precede the content id
const STAT_FIELDS_SIZE: usize = 40;

/// Highest merge stage (0 is a normal, merged entry)
pub const MAX_STAGE: u8 = 3;

const STAGE_SHIFT: u16 = 12;
const STAGE_MASK: u16 = 0x3000;

bitflags! {
    /// Single-bit flags of an index entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryFlags: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
    }
}

/// Bytes before the path: stat fields, content id and flags word
pub fn entry_fixed_size(hash: HashKind) -> usize {
    STAT_FIELDS_SIZE + hash.raw_len() + 2
}

/// Smallest possible encoded entry (one-byte path rounded up to the block size)
pub fn entry_min_size(hash: HashKind) -> usize {
    (entry_fixed_size(hash) + 1).div_ceil(ENTRY_BLOCK) * ENTRY_BLOCK
}

/// Index entry representing a staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: String,
    /// Id of the staged blob
    pub oid: ObjectId,
    /// File metadata (mode, size, timestamps)
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Every ancestor directory of the entry, outermost first
    ///
    /// `a/b/c` yields `["a", "a/b"]`; a top-level path yields nothing.
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.name
            .match_indices('/')
            .map(|(position, _)| &self.name[..position])
            .collect()
    }

    pub fn stage(&self) -> u8 {
        self.metadata.stage
    }

    fn flags_word(&self) -> u16 {
        let name_length = self.name.len().min(MAX_PATH_SIZE) as u16;
        let stage = (u16::from(self.metadata.stage) << STAGE_SHIFT) & STAGE_MASK;

        self.metadata.flags.bits() | stage | name_length
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .as_bytes()
            .cmp(other.name.as_bytes())
            .then(self.metadata.stage.cmp(&other.metadata.stage))
    }
}

/// Check that a path is relative, `/`-separated and free of `.`/`..`/empty components
pub fn is_valid_index_path(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\0')
        && path
            .split('/')
            .all(|component| !component.is_empty() && component != "." && component != "..")
}

/// File metadata stored in index entries
///
/// ## Timestamps
///
/// - `ctime`: File status change time (inode modification)
/// - `mtime`: File content modification time
///
/// Both include nanosecond precision for accurate change detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Change time (seconds since Unix epoch)
    pub ctime: i64,
    /// Change time nanoseconds
    pub ctime_nsec: i64,
    /// Modification time (seconds since Unix epoch)
    pub mtime: i64,
    /// Modification time nanoseconds
    pub mtime_nsec: i64,
    /// Device ID
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// File mode (permissions and type)
    pub mode: EntryMode,
    /// User ID of owner
    pub uid: u32,
    /// Group ID of owner
    pub gid: u32,
    /// File size in bytes
    pub size: u64,
    /// Merge stage, 0 for a normal entry
    pub stage: u8,
    /// Assume-valid and extended bits
    pub flags: EntryFlags,
}

impl EntryMetadata {
    /// Metadata for a regular file known only by size and modification time
    pub fn for_file(mode: FileMode, size: u64, mtime: i64) -> Self {
        EntryMetadata {
            mode: mode.into(),
            size,
            mtime,
            ..Default::default()
        }
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let metadata = &self.metadata;

        let mut entry_bytes = Vec::new();
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.ctime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.ctime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.mtime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.mtime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.dev as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.ino as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(metadata.size as u32)?;
        self.oid.write_raw_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(self.flags_word())?;
        entry_bytes.write_all(self.name.as_bytes())?;

        // Ensure the entry bytes are padded to ENTRY_BLOCK size with null bytes
        entry_bytes.push(0); // There must be at least one null byte at the end
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead, hash: HashKind) -> anyhow::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let fixed_size = entry_fixed_size(hash);
        if bytes.len() < entry_min_size(hash) || bytes.len() % ENTRY_BLOCK != 0 {
            return Err(anyhow::anyhow!("Invalid index entry size"));
        }

        let field = |index: usize| byteorder::NetworkEndian::read_u32(&bytes[index * 4..index * 4 + 4]);
        let mode = EntryMode::try_from(field(6))?;
        let oid = ObjectId::from_raw(&bytes[STAT_FIELDS_SIZE..STAT_FIELDS_SIZE + hash.raw_len()])?;
        let flags_word = byteorder::NetworkEndian::read_u16(&bytes[fixed_size - 2..fixed_size]);
        let flags = EntryFlags::from_bits_truncate(flags_word);
        if flags.contains(EntryFlags::EXTENDED) {
            return Err(anyhow::anyhow!("Extended index entries are not supported"));
        }

        // Extract the entry name, which is null-terminated
        let name_end = bytes[fixed_size..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow::anyhow!("Missing null terminator in entry name"))?;
        let name = std::str::from_utf8(&bytes[fixed_size..fixed_size + name_end])
            .map_err(|_| anyhow::anyhow!("Invalid UTF-8 in entry name"))?
            .to_string();
        if !is_valid_index_path(&name) {
            return Err(anyhow::anyhow!("Invalid path in index entry: {name:?}"));
        }

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime: field(0) as i64,
                ctime_nsec: field(1) as i64,
                mtime: field(2) as i64,
                mtime_nsec: field(3) as i64,
                dev: field(4) as u64,
                ino: field(5) as u64,
                mode,
                uid: field(7),
                gid: field(8),
                size: field(9) as u64,
                stage: ((flags_word & STAGE_MASK) >> STAGE_SHIFT) as u8,
                flags,
            },
        })
    }
}

impl TryFrom<&Metadata> for EntryMetadata {
    type Error = anyhow::Error;

    fn try_from(metadata: &Metadata) -> Result<Self, Self::Error> {
        let mode = if metadata.is_dir() {
            EntryMode::Directory
        } else {
            EntryMode::try_from(metadata.mode())?
        };

        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            stage: 0,
            flags: EntryFlags::empty(),
        })
    }
}
