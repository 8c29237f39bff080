use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::Path;
use tracing::debug;

impl Repository {
    /// Print the blob id of a file, storing the blob when `write` is set
    pub fn hash_object(&mut self, object_path: &str, write: bool) -> anyhow::Result<()> {
        let content = self.workspace().read_file(Path::new(object_path))?;

        let object_id = if write {
            let oid = self.database().write(ObjectType::Blob, &content)?;
            debug!(oid = %oid, path = object_path, "stored blob");
            oid
        } else {
            self.database().hash(ObjectType::Blob, &content)?
        };

        writeln!(self.writer(), "{object_id}")?;

        Ok(())
    }
}
