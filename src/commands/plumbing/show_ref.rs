use crate::areas::repository::Repository;

impl Repository {
    /// Print every branch then every tag as `<id> refs/<kind>/<name>`
    pub fn show_ref(&mut self) -> anyhow::Result<()> {
        for name in self.refs().list_branches()? {
            if let Some(oid) = self.refs().read_branch(&name)? {
                writeln!(self.writer(), "{oid} refs/heads/{name}")?;
            }
        }

        for name in self.refs().list()? {
            let oid = self.refs().resolve(&name)?;
            writeln!(self.writer(), "{oid} refs/tags/{name}")?;
        }

        Ok(())
    }
}
