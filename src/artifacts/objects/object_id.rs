//! Object identifier (content digest)
//!
//! Object IDs are lowercase hexadecimal renderings of the digest of an
//! object's tagged encoding. Their width follows the configured
//! [`HashKind`]: 40 characters for SHA-1, 64 for SHA-256.
//!
//! ## Storage
//!
//! Objects are stored in `objects/<first-N-chars>/<remaining-chars>`, where
//! N is the configured fan-out (2 by default).

use crate::artifacts::core::hash_kind::HashKind;
use std::io;
use std::path::PathBuf;

/// Length of an abbreviated object ID
pub const SHORT_OID_LENGTH: usize = 7;

/// Object identifier
///
/// A validated, lowercase hexadecimal digest that uniquely identifies an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Accepts any supported digest width (40 or 64 hex characters).
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if HashKind::from_hex_len(id.len()).is_none() {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object ID from a raw digest
    pub fn from_raw(raw: &[u8]) -> anyhow::Result<Self> {
        let hex = raw.iter().map(|byte| format!("{byte:02x}")).collect();
        Self::try_parse(hex)
    }

    /// The digest algorithm this id was produced with
    pub fn hash_kind(&self) -> HashKind {
        HashKind::from_hex_len(self.0.len()).unwrap_or_default()
    }

    /// Write the object ID in raw binary form (20 or 32 bytes)
    ///
    /// Used when serializing tree objects and index entries.
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let hex = self.as_ref();

        for i in (0..hex.len()).step_by(2) {
            let byte = u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID in raw binary form
    ///
    /// Reads exactly `hash.raw_len()` bytes and converts them to hex.
    pub fn read_raw_from<R: io::Read + ?Sized>(
        reader: &mut R,
        hash: HashKind,
    ) -> anyhow::Result<Self> {
        let mut raw = vec![0; hash.raw_len()];
        reader.read_exact(&mut raw)?;

        Self::from_raw(&raw)
    }

    /// Convert to the file system path used for object storage
    ///
    /// Splits the hash as `XX/YYYY...` where XX is the first `fan_out` chars.
    /// For example, `abc123...` becomes `ab/c123...` with the default fan-out.
    pub fn to_path(&self, fan_out: usize) -> PathBuf {
        let (dir, file) = self.0.split_at(fan_out.min(self.0.len() - 1));
        PathBuf::from(dir).join(file)
    }

    /// Get abbreviated form of the object ID
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(SHORT_OID_LENGTH).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
