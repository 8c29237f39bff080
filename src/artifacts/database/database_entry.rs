use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use derive_new::new;

/// A child of a tree: the id it points at and the mode it is recorded with
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct DatabaseEntry {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl DatabaseEntry {
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }

    pub fn object_type(&self) -> ObjectType {
        if self.is_tree() {
            ObjectType::Tree
        } else {
            ObjectType::Blob
        }
    }
}
