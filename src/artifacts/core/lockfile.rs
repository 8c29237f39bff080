//! Scoped sentinel lock
//!
//! A `Lockfile` claims `<path>.lock` with an exclusive create. While held, the
//! lock file doubles as the staging area for the new contents of `<path>`:
//! [`Lockfile::commit`] renames it into place atomically, and dropping an
//! uncommitted lock removes the sentinel, so every exit path (including
//! errors and panics) releases the lock.

use crate::errors::{StoreError, StoreResult};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Lockfile {
    /// The file protected by this lock
    target_path: PathBuf,
    /// The sentinel `<target>.lock`
    lock_path: PathBuf,
    /// Open handle to the sentinel, `None` once committed
    file: Option<File>,
}

impl Lockfile {
    /// Claim the lock for `target_path`, failing with `Locked` if it is held
    pub fn acquire(target_path: &Path) -> StoreResult<Self> {
        let file_name = target_path.file_name().ok_or_else(|| {
            StoreError::InvalidFormat(format!("cannot lock {}", target_path.display()))
        })?;
        let mut lock_name = file_name.to_os_string();
        lock_name.push(".lock");
        let lock_path = target_path.with_file_name(lock_name);

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|error| match error.kind() {
                io::ErrorKind::AlreadyExists => StoreError::Locked {
                    path: lock_path.clone(),
                },
                _ => StoreError::io(&lock_path)(error),
            })?;

        Ok(Lockfile {
            target_path: target_path.to_path_buf(),
            lock_path,
            file: Some(file),
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Flush the staged contents and rename them over the target
    pub fn commit(mut self) -> StoreResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(StoreError::io(&self.lock_path))?;
            drop(file);

            if let Err(error) = std::fs::rename(&self.lock_path, &self.target_path) {
                let _ = std::fs::remove_file(&self.lock_path);
                return Err(StoreError::io(&self.target_path)(error));
            }
        }

        Ok(())
    }

    fn handle(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock already committed"))
    }
}

impl Write for Lockfile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.handle()?.flush()
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
