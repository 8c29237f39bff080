use crate::artifacts::core::hash_kind::HashKind;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::BufRead;

/// Types with a deterministic binary encoding
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Types that can be decoded from their binary encoding
///
/// The digest width is passed along since raw ids embedded in trees and
/// index entries depend on it.
pub trait Unpackable {
    fn deserialize(reader: impl BufRead, hash: HashKind) -> Result<Self>
    where
        Self: Sized;
}

/// A storable object: `serialize` yields the content, `encode` the tagged form
pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    /// Tagged encoding `<type> <size>\0<content>` the id is derived from
    fn encode(&self) -> Result<Bytes> {
        let content = self.serialize()?;
        Ok(encode_object(self.object_type(), &content))
    }

    fn object_id(&self, hash: HashKind) -> Result<ObjectId> {
        let content = self.serialize()?;
        object_id_for(hash, self.object_type(), &content)
    }
}

pub fn encode_object(object_type: ObjectType, content: &[u8]) -> Bytes {
    let header = object_type.header(content.len());
    let mut encoded = Vec::with_capacity(header.len() + content.len());
    encoded.extend_from_slice(header.as_bytes());
    encoded.extend_from_slice(content);

    Bytes::from(encoded)
}

/// Content address of `(object_type, content)` under `hash`
pub fn object_id_for(hash: HashKind, object_type: ObjectType, content: &[u8]) -> Result<ObjectId> {
    let mut hasher = hash.hasher();
    hasher.update(object_type.header(content.len()).as_bytes());
    hasher.update(content);

    ObjectId::from_raw(&hasher.finalize())
}

/// One decoded object of any of the four kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
    Tag(Box<Tag>),
}

impl ObjectBox {
    pub fn parse(object_type: ObjectType, content: &[u8], hash: HashKind) -> Result<Self> {
        Ok(match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(content, hash)?)),
            ObjectType::Tree => ObjectBox::Tree(Box::new(Tree::deserialize(content, hash)?)),
            ObjectType::Commit => {
                ObjectBox::Commit(Box::new(Commit::deserialize(content, hash)?))
            }
            ObjectType::Tag => ObjectBox::Tag(Box::new(Tag::deserialize(content, hash)?)),
        })
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(blob) => blob.object_type(),
            ObjectBox::Tree(tree) => tree.object_type(),
            ObjectBox::Commit(commit) => commit.object_type(),
            ObjectBox::Tag(tag) => tag.object_type(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
            ObjectBox::Tag(tag) => tag.display(),
        }
    }
}
