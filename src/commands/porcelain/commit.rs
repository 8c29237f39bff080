use crate::areas::commit_writer::CommitWriter;
use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Author;
use tracing::info;

const BRANCH_PREFIX: &str = "refs/heads/";

/// Trim surrounding whitespace and end the message with a single newline
pub(crate) fn normalize_message(message: &str) -> String {
    format!("{}\n", message.trim())
}

impl Repository {
    /// Commit the staged tree on top of HEAD and advance the current branch
    pub async fn commit(&mut self, message: &str) -> anyhow::Result<()> {
        if message.trim().is_empty() {
            anyhow::bail!("Aborting commit due to empty commit message.");
        }

        let tree_oid = self.build_tree_from_index().await?;
        let parent = self.refs().read_head()?;

        let author = Author::load_from_env()?;
        let committer = Author::load_committer_from_env()?;
        let message = normalize_message(message);

        let commit_oid = CommitWriter::new(self.database()).create(
            &tree_oid,
            parent.as_slice(),
            author,
            committer,
            &message,
        )?;
        self.refs().update_head(&commit_oid)?;

        let current_ref = self.refs().current_ref()?;
        let branch = current_ref
            .strip_prefix(BRANCH_PREFIX)
            .unwrap_or("detached HEAD");
        let is_root = if parent.is_none() { " (root-commit)" } else { "" };
        info!(commit = %commit_oid, branch, "created commit");

        writeln!(
            self.writer(),
            "[{branch}{is_root} {}] {}",
            commit_oid.to_short_oid(),
            message.lines().next().unwrap_or_default()
        )?;

        Ok(())
    }
}
