//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (none for a root commit, several for a merge)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-id>
//! parent <parent-id>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! Headers the store does not interpret (`gpgsig`, `encoding`, ...) are
//! kept verbatim after the committer line.

use crate::artifacts::core::hash_kind::HashKind;
use crate::artifacts::objects::headers::Headers;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Read};

/// Author, committer or tagger information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author with the current timestamp
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    /// Create a new author with a specific timestamp
    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Format author name and email for display
    ///
    /// # Returns
    ///
    /// String in format "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Format complete author info including timestamp
    ///
    /// # Returns
    ///
    /// String in format "Name <email> timestamp timezone"
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author information from environment variables
    ///
    /// Reads GIT_AUTHOR_NAME, GIT_AUTHOR_EMAIL, and optionally GIT_AUTHOR_DATE.
    /// If no date is provided, uses current time.
    pub fn load_from_env() -> anyhow::Result<Self> {
        Self::load_identity("AUTHOR")
    }

    /// Load committer information from environment variables
    ///
    /// Reads the GIT_COMMITTER_* variables, falling back to the author
    /// identity when GIT_COMMITTER_NAME is not set.
    pub fn load_committer_from_env() -> anyhow::Result<Self> {
        if std::env::var("GIT_COMMITTER_NAME").is_ok() {
            Self::load_identity("COMMITTER")
        } else {
            Self::load_from_env()
        }
    }

    fn load_identity(role: &str) -> anyhow::Result<Self> {
        let name_var = format!("GIT_{role}_NAME");
        let email_var = format!("GIT_{role}_EMAIL");
        let date_var = format!("GIT_{role}_DATE");

        let name = std::env::var(&name_var).with_context(|| format!("{name_var} not set"))?;
        let email = std::env::var(&email_var).with_context(|| format!("{email_var} not set"))?;
        if [&name, &email].iter().any(|s| s.contains(['<', '>', '\n'])) {
            anyhow::bail!("{name_var} and {email_var} must not contain '<', '>' or newlines");
        }

        let timestamp = std::env::var(&date_var).ok().and_then(|date_str| {
            chrono::DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(name, email, ts)),
            None => Ok(Author::new(name, email)),
        }
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid author format"));
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp"))?;
        let name_email_part = parts[2]; // "name <email>"

        // Extract email from within angle brackets
        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let offset = chrono::DateTime::parse_from_str(&format!("1970-01-01 00:00:00 {timezone}"), "%Y-%m-%d %H:%M:%S %z")
            .map_err(|_| anyhow::anyhow!("Invalid timezone"))?
            .offset()
            .to_owned();
        let datetime = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp: datetime,
        })
    }
}

/// Commit object
///
/// Represents a snapshot of the repository with metadata.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for initial commit, multiple for merge commits)
    parents: Vec<ObjectId>,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Author who wrote the changes
    author: Author,
    /// Committer who recorded the commit
    committer: Author,
    /// Uninterpreted headers, kept in their original order
    extra_headers: Vec<(String, String)>,
    /// Commit message
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        committer: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author,
            committer,
            extra_headers: Vec::new(),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.committer.timestamp()
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::default();

        headers.push("tree", self.tree_oid.as_ref());
        for parent in &self.parents {
            headers.push("parent", parent.as_ref());
        }
        headers.push("author", self.author.display());
        headers.push("committer", self.committer.display());
        for (key, value) in &self.extra_headers {
            headers.push(key, value.as_str());
        }
        headers.set_message(self.message.as_str());

        headers
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.headers().serialize()))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead, _hash: HashKind) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let headers = Headers::parse(&content)?;
        let mut fields = headers.fields().iter().peekable();

        let tree_oid = match fields.next() {
            Some((key, value)) if key == "tree" => ObjectId::try_parse(value.clone())?,
            _ => anyhow::bail!("Invalid commit object: missing tree line"),
        };

        // Parse all parent lines (there can be 0, 1, or multiple parents)
        let mut parents = Vec::new();
        while let Some((_, value)) = fields.next_if(|(key, _)| key == "parent") {
            parents.push(ObjectId::try_parse(value.clone())?);
        }

        let author = match fields.next() {
            Some((key, value)) if key == "author" => Author::try_from(value.as_str())?,
            _ => anyhow::bail!("Invalid commit object: missing author line"),
        };
        let committer = match fields.next() {
            Some((key, value)) if key == "committer" => Author::try_from(value.as_str())?,
            _ => anyhow::bail!("Invalid commit object: missing committer line"),
        };

        Ok(Commit {
            parents,
            tree_oid,
            author,
            committer,
            extra_headers: fields.cloned().collect(),
            message: headers.message().to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.headers().serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
    const PARENT: &str = "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0";

    #[fixture]
    fn author() -> Author {
        Author::try_from("Jane Doe <jane@example.com> 1700000000 +0200").unwrap()
    }

    #[rstest]
    fn author_line_survives_parse(author: Author) {
        assert_eq!(author.display(), "Jane Doe <jane@example.com> 1700000000 +0200");
        assert_eq!(author.display_name(), "Jane Doe <jane@example.com>");
    }

    #[rstest]
    fn serializes_in_canonical_field_order(author: Author) {
        let commit = Commit::new(
            vec![ObjectId::try_parse(PARENT.to_string()).unwrap()],
            ObjectId::try_parse(TREE.to_string()).unwrap(),
            author.clone(),
            author,
            "initial\n".to_string(),
        );

        let expected = format!(
            "tree {TREE}\nparent {PARENT}\nauthor Jane Doe <jane@example.com> 1700000000 +0200\ncommitter Jane Doe <jane@example.com> 1700000000 +0200\n\ninitial\n"
        );
        assert_eq!(commit.display(), expected);
        assert_eq!(
            Commit::deserialize(expected.as_bytes(), HashKind::Sha1).unwrap(),
            commit
        );
    }

    #[test]
    fn keeps_signature_headers_verbatim() {
        let raw = format!(
            "tree {TREE}\nauthor A <a@x> 1 +0000\ncommitter C <c@x> 2 -0130\ngpgsig -----BEGIN PGP SIGNATURE-----\n \n abc\n -----END PGP SIGNATURE-----\n\nsigned\n"
        );

        let commit = Commit::deserialize(raw.as_bytes(), HashKind::Sha1).unwrap();

        assert!(commit.parents().is_empty());
        assert_eq!(commit.committer().display(), "C <c@x> 2 -0130");
        assert_eq!(commit.extra_headers()[0].0, "gpgsig");
        assert_eq!(commit.serialize().unwrap(), Bytes::from(raw));
    }

    #[rstest]
    #[case("author A <a@x> 1 +0000\n\nmsg")]
    #[case("tree nothex\n\nmsg")]
    fn rejects_malformed_commits(#[case] raw: &str) {
        assert!(Commit::deserialize(raw.as_bytes(), HashKind::Sha1).is_err());
    }
}
