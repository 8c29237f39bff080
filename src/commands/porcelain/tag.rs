use crate::areas::refs::HEAD_REF_NAME;
use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::refs::revision::Revision;
use crate::commands::porcelain::commit::normalize_message;
use crate::errors::StoreError;
use tracing::info;

/// What `tag` was asked to create
#[derive(Debug, Clone, Default)]
pub struct TagOptions<'a> {
    /// Revision to tag, HEAD when absent
    pub target: Option<&'a str>,
    /// Store a tag object; implied by `message`
    pub annotate: bool,
    pub message: Option<&'a str>,
    /// Replace an existing tag of the same name
    pub force: bool,
}

impl Repository {
    pub fn tag(&mut self, name: &str, options: TagOptions<'_>) -> anyhow::Result<()> {
        let target = Revision::try_parse(options.target.unwrap_or(HEAD_REF_NAME))?
            .resolve(self)?;

        let previous = match self.refs().resolve(name) {
            Ok(oid) => Some(oid),
            Err(StoreError::NotFound { .. }) => None,
            Err(error) => return Err(error.into()),
        };

        if options.annotate || options.message.is_some() {
            let message = options
                .message
                .filter(|message| !message.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("no tag message given for annotated tag '{name}'"))?;
            let tagger = Author::load_committer_from_env()?;

            let tag_oid = self.refs().create_annotated(
                self.database(),
                name,
                &target,
                tagger,
                &normalize_message(message),
                options.force,
            )?;
            info!(tag = name, object = %tag_oid, target = %target, "created annotated tag");
        } else {
            self.refs()
                .create_lightweight(self.database(), name, &target, options.force)?;
            info!(tag = name, target = %target, "created lightweight tag");
        }

        if let Some(previous) = previous {
            writeln!(
                self.writer(),
                "Updated tag '{name}' (was {})",
                previous.to_short_oid()
            )?;
        }

        Ok(())
    }

    pub fn list_tags(&mut self) -> anyhow::Result<()> {
        for name in self.refs().list()? {
            writeln!(self.writer(), "{name}")?;
        }

        Ok(())
    }

    pub fn delete_tag(&mut self, name: &str) -> anyhow::Result<()> {
        let oid = self.refs().delete(name)?;
        info!(tag = name, "deleted tag");

        writeln!(
            self.writer(),
            "Deleted tag '{name}' (was {})",
            oid.to_short_oid()
        )?;

        Ok(())
    }
}
