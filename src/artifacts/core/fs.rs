use crate::errors::{StoreError, StoreResult};
use fake::rand;
use std::io::Write;
use std::path::Path;

/// Write `data` to `path` so that readers only ever see the old or the new file.
///
/// The bytes go to a uniquely named temporary file in the same directory,
/// which is then renamed over `path`. A failure before the rename leaves
/// `path` untouched; the stale temporary file is removed on a best-effort basis.
pub fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::InvalidFormat(format!("{} has no parent", path.display())))?;
    std::fs::create_dir_all(dir).map_err(StoreError::io(dir))?;

    let temp_path = dir.join(generate_temp_name());
    let result = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|_| std::fs::rename(&temp_path, path));

    if let Err(error) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::io(path)(error));
    }

    Ok(())
}

/// A fresh temporary file name ending in `.lock`, which no ref name may use,
/// so a leftover never shows up as a ref
pub fn generate_temp_name() -> String {
    format!("tmp-obj-{}.lock", rand::random::<u32>())
}
