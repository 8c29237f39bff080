use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use std::path::Path;
use tracing::debug;

impl Repository {
    /// Refresh the index entries of individual files
    ///
    /// Untracked files need `add`, files gone from disk need `remove`.
    pub async fn update_index(
        &mut self,
        paths: &[String],
        add: bool,
        remove: bool,
    ) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        let mut staged = index.lock_for_update()?;

        for path in paths {
            let relative = self.workspace().relative(Path::new(path))?;
            let name = Workspace::index_path(&relative)?;

            if self.workspace().path().join(&relative).is_file()
                || self.workspace().path().join(&relative).is_symlink()
            {
                if !add && !staged.is_tracked(&name) {
                    anyhow::bail!("{name}: cannot add to the index - missing --add option?");
                }
                self.stage_file(&mut staged, &relative)?;
            } else if remove {
                if staged.remove(&name) {
                    debug!(path = %name, "removed from index");
                }
            } else {
                anyhow::bail!("{name}: does not exist and --remove not passed");
            }
        }

        staged.save()?;
        Ok(())
    }
}
