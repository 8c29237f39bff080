use crate::areas::commit_writer::CommitWriter;
use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::revision::Revision;
use crate::commands::porcelain::commit::normalize_message;

impl Repository {
    /// Store a commit of `tree` with the given parents and print its id
    ///
    /// No ref moves.
    pub fn commit_tree(
        &mut self,
        tree: &str,
        parents: &[String],
        message: &str,
    ) -> anyhow::Result<()> {
        let tree_oid = Revision::peel(
            Revision::try_parse(tree)?.resolve(self)?,
            ObjectType::Tree,
            self,
        )?;

        let parent_oids = parents
            .iter()
            .map(|parent| {
                let oid = Revision::try_parse(parent)?.resolve(self)?;
                Revision::peel(oid, ObjectType::Commit, self)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let commit_oid = CommitWriter::new(self.database()).create(
            &tree_oid,
            &parent_oids,
            Author::load_from_env()?,
            Author::load_committer_from_env()?,
            &normalize_message(message),
        )?;

        writeln!(self.writer(), "{commit_oid}")?;
        Ok(())
    }
}
