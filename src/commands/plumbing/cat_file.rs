use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::refs::revision::Revision;

/// Which part of an object `cat-file` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatFileMode {
    #[default]
    Pretty,
    Type,
    Size,
}

impl Repository {
    pub fn cat_file(&mut self, name: &str, mode: CatFileMode) -> anyhow::Result<()> {
        let oid = Revision::try_parse(name)?.resolve(self)?;

        match mode {
            CatFileMode::Type => {
                let object_type = self.database().object_type(&oid)?;
                writeln!(self.writer(), "{object_type}")?;
            }
            CatFileMode::Size => {
                let (_, content) = self.database().read(&oid)?;
                writeln!(self.writer(), "{}", content.len())?;
            }
            CatFileMode::Pretty => match self.database().parse_object(&oid)? {
                ObjectBox::Blob(blob) => self.writer().write_all(blob.content())?,
                ObjectBox::Tree(tree) if tree.is_empty() => {}
                tree @ ObjectBox::Tree(_) => writeln!(self.writer(), "{}", tree.display())?,
                object => write!(self.writer(), "{}", object.display())?,
            },
        }

        Ok(())
    }
}
