use crate::areas::repository::Repository;
use crate::areas::tree_builder::TreeBuilder;
use crate::artifacts::objects::object_id::ObjectId;
use tracing::debug;

impl Repository {
    /// Store the tree of the current index and print its id
    pub async fn write_tree(&mut self) -> anyhow::Result<()> {
        let tree_oid = self.build_tree_from_index().await?;
        writeln!(self.writer(), "{tree_oid}")?;

        Ok(())
    }

    pub(crate) async fn build_tree_from_index(&self) -> anyhow::Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;

        let tree_oid = TreeBuilder::new(self.database()).build(index.entries())?;
        debug!(tree = %tree_oid, entries = index.len(), "built tree from index");

        Ok(tree_oid)
    }
}
