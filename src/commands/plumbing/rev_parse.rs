use crate::areas::repository::Repository;
use crate::artifacts::refs::revision::Revision;

impl Repository {
    pub fn rev_parse(&mut self, name: &str) -> anyhow::Result<()> {
        let oid = Revision::try_parse(name)?.resolve(self)?;
        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}
