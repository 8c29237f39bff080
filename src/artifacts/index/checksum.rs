use crate::artifacts::core::hash_kind::{HashKind, Hasher};
use crate::errors::{StoreError, StoreResult};
use bytes::Bytes;
use std::io::{Read, Write};

/// Reader or writer that digests every byte passing through it
///
/// The index trailer is the digest of everything before it, so the header
/// and entries are streamed through a `Checksum` and the trailer is either
/// verified (`verify`) or appended (`write_checksum`).
#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    hash: HashKind,
    digest: Hasher,
}

impl<T> Checksum<T> {
    pub fn new(inner: T, hash: HashKind) -> Self {
        Checksum {
            inner,
            hash,
            digest: hash.hasher(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<R: Read> Checksum<R> {
    pub fn read(&mut self, size: usize) -> StoreResult<Bytes> {
        let mut buffer = vec![0; size];
        self.inner
            .read_exact(&mut buffer)
            .map_err(|_| StoreError::corrupt("index", "unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub fn verify(&mut self) -> StoreResult<()> {
        let mut expected_checksum = vec![0u8; self.hash.raw_len()];
        self.inner
            .read_exact(&mut expected_checksum)
            .map_err(|_| StoreError::corrupt("index", "missing trailing checksum"))?;

        let actual_checksum = self.digest.clone().finalize();
        if expected_checksum != actual_checksum {
            return Err(StoreError::corrupt(
                "index",
                "checksum does not match value stored on disk",
            ));
        }

        let mut trailing = [0u8; 1];
        if self.inner.read(&mut trailing).unwrap_or(0) != 0 {
            return Err(StoreError::corrupt("index", "unexpected data after checksum"));
        }

        Ok(())
    }
}

impl<W: Write> Checksum<W> {
    pub fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> std::io::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.inner.write_all(&checksum)
    }
}
