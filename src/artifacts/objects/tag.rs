//! Annotated tag object
//!
//! ## Format
//!
//! ```text
//! tag <size>\0
//! object <target-id>
//! type <blob|tree|commit|tag>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```

use crate::artifacts::core::hash_kind::HashKind;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::headers::Headers;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Read};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Author,
    message: String,
}

impl Tag {
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tagger(&self) -> &Author {
        &self.tagger
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::default();

        headers.push("object", self.target.as_ref());
        headers.push("type", self.target_type.as_str());
        headers.push("tag", self.name.as_str());
        headers.push("tagger", self.tagger.display());
        headers.set_message(self.message.as_str());

        headers
    }
}

impl Packable for Tag {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.headers().serialize()))
    }
}

impl Unpackable for Tag {
    fn deserialize(mut reader: impl BufRead, _hash: HashKind) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let headers = Headers::parse(&content)?;
        let field = |name: &str| {
            headers
                .fields()
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid tag object: missing {name} line"))
        };

        Ok(Tag {
            target: ObjectId::try_parse(field("object")?.to_string())?,
            target_type: ObjectType::try_from(field("type")?)?,
            name: field("tag")?.to_string(),
            tagger: Author::try_from(field("tagger")?)?,
            message: headers.message().to_string(),
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        self.headers().serialize()
    }
}
