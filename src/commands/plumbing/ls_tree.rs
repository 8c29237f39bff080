use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::revision::Revision;

enum Work {
    Line(String),
    Tree(ObjectId, String),
}

impl Repository {
    /// List a tree (or the tree of a commit or tag), descending into
    /// subtrees when `recursive` is set
    ///
    /// Subtrees are expanded from an explicit work stack so output order
    /// matches a depth-first walk without recursion.
    pub fn ls_tree(&mut self, name: &str, recursive: bool) -> anyhow::Result<()> {
        let oid = Revision::try_parse(name)?.resolve(self)?;
        let tree_oid = Revision::peel(oid, ObjectType::Tree, self)?;

        let mut stack = vec![Work::Tree(tree_oid, String::new())];
        while let Some(work) = stack.pop() {
            match work {
                Work::Line(line) => writeln!(self.writer(), "{line}")?,
                Work::Tree(oid, prefix) => {
                    let tree = self.database().parse_object_as_tree(&oid)?;

                    let mut expanded = Vec::with_capacity(tree.len());
                    for (name, entry) in tree.into_entries() {
                        let path = format!("{prefix}{name}");
                        if recursive && entry.is_tree() {
                            expanded.push(Work::Tree(entry.oid, format!("{path}/")));
                        } else {
                            expanded.push(Work::Line(format!(
                                "{:0>6} {} {}\t{path}",
                                entry.mode.as_str(),
                                entry.object_type(),
                                entry.oid
                            )));
                        }
                    }
                    stack.extend(expanded.into_iter().rev());
                }
            }
        }

        Ok(())
    }
}
