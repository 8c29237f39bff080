use crate::areas::repository::Repository;

impl Repository {
    /// Print staged paths; with `stage`, also their mode, id and stage number
    pub async fn ls_files(&mut self, stage: bool) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;

        for entry in index.entries() {
            if stage {
                writeln!(
                    self.writer(),
                    "{} {} {}\t{}",
                    entry.metadata.mode.as_str(),
                    entry.oid,
                    entry.stage(),
                    entry.name
                )?;
            } else {
                writeln!(self.writer(), "{}", entry.name)?;
            }
        }

        Ok(())
    }
}
