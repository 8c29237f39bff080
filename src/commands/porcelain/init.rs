use crate::areas::refs::DEFAULT_BRANCH;
use crate::areas::repository::Repository;
use crate::artifacts::core::config::CONFIG_FILE;
use crate::artifacts::core::fs::write_atomic;
use anyhow::Context;
use std::fs;
use tracing::info;

impl Repository {
    /// Create the repository layout, leaving existing content alone
    ///
    /// The index file is not created: an absent index reads as empty. The
    /// object format is recorded in `.git/config` unless one is already there.
    pub async fn init(&mut self) -> anyhow::Result<()> {
        let reinitialized = self.refs().head_path().exists();

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .git/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .git/refs/heads directory")?;

        fs::create_dir_all(self.refs().tags_path())
            .context("Failed to create .git/refs/tags directory")?;

        let config_path = self.git_path().join(CONFIG_FILE);
        if !config_path.exists() {
            write_atomic(&config_path, self.config().render().as_bytes())
                .context("Failed to write .git/config")?;
        }

        if !reinitialized {
            self.refs()
                .set_head(DEFAULT_BRANCH)
                .context("Failed to create initial HEAD reference")?;
        }

        info!(path = %self.git_path().display(), hash = %self.config().hash, "initialized repository");

        writeln!(
            self.writer(),
            "{} empty Git repository in {}",
            if reinitialized { "Reinitialized existing" } else { "Initialized" },
            self.git_path().display()
        )?;

        Ok(())
    }
}
