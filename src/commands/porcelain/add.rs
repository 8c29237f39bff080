use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use std::path::Path;
use tracing::{debug, warn};

impl Repository {
    /// Stage every file under `paths`, all or nothing
    ///
    /// Staged files that disappeared under a pathspec are unstaged. Any
    /// failure (an unreadable file, a pathspec matching nothing) leaves the
    /// index file untouched.
    pub async fn add(&mut self, paths: &[String]) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        let mut staged = index.lock_for_update()?;

        for pathspec in paths {
            let relative = self.workspace().relative(Path::new(pathspec))?;
            let prefix = Workspace::index_path(&relative)?;

            let missing = staged
                .entries()
                .iter()
                .filter(|entry| Self::is_under(&entry.name, &prefix))
                .filter(|entry| !self.workspace().path().join(&entry.name).exists())
                .map(|entry| entry.name.clone())
                .collect::<Vec<_>>();
            for name in &missing {
                debug!(path = %name, "unstaging deleted file");
                staged.remove(name);
            }

            let files = match self.workspace().list_files(Some(&relative)) {
                Ok(files) => files,
                Err(_) if !missing.is_empty() => Vec::new(),
                Err(error) => {
                    warn!(pathspec = %pathspec, "aborting add, index left unchanged");
                    return Err(error);
                }
            };

            for file in files {
                if let Err(error) = self.stage_file(&mut staged, &file) {
                    warn!(path = %file.display(), "aborting add, index left unchanged");
                    return Err(error);
                }
            }
        }

        staged.save()?;
        Ok(())
    }

    pub(crate) fn stage_file(&self, index: &mut Index, file: &Path) -> anyhow::Result<()> {
        let data = self.workspace().read_file(file)?;
        let metadata = self.workspace().stat_file(file)?;
        let name = Workspace::index_path(file)?;

        let blob_oid = self.database().store(&Blob::new(data))?;
        debug!(path = %name, oid = %blob_oid, "staging file");

        index.upsert(IndexEntry::new(name, blob_oid, metadata))?;
        Ok(())
    }

    fn is_under(name: &str, prefix: &str) -> bool {
        prefix.is_empty()
            || name == prefix
            || name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
