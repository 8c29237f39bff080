use crate::areas::repository::Repository;
use crate::areas::refs::HEAD_REF_NAME;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::{ANCESTOR_REGEX, HEAD_ALIAS, PARENT_REGEX};
use crate::errors::StoreError;
use anyhow::Context;

/// Shortest abbreviated id accepted when resolving names
pub const MIN_PREFIX_LENGTH: usize = 4;

/// A name for an object, as accepted by `rev-parse` and friends
///
/// A base name is looked up in this order:
/// - `HEAD` (or `@`): the commit HEAD resolves to
/// - a full object id of the configured width
/// - a tag name (`refs/tags/<name>`)
/// - a branch name (`refs/heads/<name>`)
/// - an abbreviated id of at least four hex characters
///
/// `<rev>^` and `<rev>~<n>` step to first parents, peeling tags on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Name(String),
    /// The parent of a revision (e.g. HEAD^)
    Parent(Box<Revision>),
    /// The Nth ancestor of a revision (e.g. HEAD~3)
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        let parent = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        let ancestor = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;

        if let Some(caps) = parent.captures(revision) {
            Ok(Revision::Parent(Box::new(Self::try_parse(&caps[1])?)))
        } else if let Some(caps) = ancestor.captures(revision) {
            let generations: usize = caps[2]
                .parse()
                .with_context(|| format!("failed to parse generations in revision: {revision}"))?;

            Ok(Revision::Ancestor(
                Box::new(Self::try_parse(&caps[1])?),
                generations,
            ))
        } else if revision.is_empty() || revision.contains(char::is_whitespace) {
            anyhow::bail!("invalid revision: {revision:?}")
        } else if revision == HEAD_ALIAS {
            Ok(Revision::Name(HEAD_REF_NAME.to_string()))
        } else {
            Ok(Revision::Name(revision.to_string()))
        }
    }

    pub fn resolve(&self, repository: &Repository) -> anyhow::Result<ObjectId> {
        match self {
            Revision::Name(name) => Self::resolve_name(name, repository),
            Revision::Parent(base) => Self::first_parent(base.resolve(repository)?, repository),
            Revision::Ancestor(base, generations) => {
                let mut oid = base.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(oid, repository)?;
                }

                Ok(oid)
            }
        }
    }

    fn resolve_name(name: &str, repository: &Repository) -> anyhow::Result<ObjectId> {
        if name == HEAD_REF_NAME {
            return repository
                .refs()
                .read_head()?
                .with_context(|| format!("{HEAD_REF_NAME} does not point to a commit yet"));
        }

        let hash = repository.config().hash;
        let looks_like_oid = name.chars().all(|c| c.is_ascii_hexdigit());

        if looks_like_oid && name.len() == hash.hex_len() {
            let oid = ObjectId::try_parse(name.to_string())?;
            if repository.database().exists(&oid) {
                return Ok(oid);
            }
        }

        match repository.refs().resolve(name) {
            Ok(oid) => return Ok(oid),
            Err(StoreError::NotFound { .. } | StoreError::InvalidFormat(_)) => {}
            Err(error) => return Err(error.into()),
        }

        match repository.refs().read_branch(name) {
            Ok(Some(oid)) => return Ok(oid),
            Ok(None) | Err(StoreError::InvalidFormat(_)) => {}
            Err(error) => return Err(error.into()),
        }

        if looks_like_oid && name.len() >= MIN_PREFIX_LENGTH {
            let matches = repository.database().find_objects_by_prefix(name)?;

            match matches.as_slice() {
                [] => {}
                [oid] => return Ok(oid.clone()),
                candidates => {
                    let mut message = format!("short object ID {name} is ambiguous\nhint: The candidates are:");
                    for oid in candidates {
                        let kind = repository
                            .database()
                            .object_type(oid)
                            .map(|kind| kind.to_string())
                            .unwrap_or_else(|_| "unknown".to_string());
                        message.push_str(&format!("\nhint:   {} {kind}", oid.to_short_oid()));
                    }
                    anyhow::bail!(message)
                }
            }
        }

        Err(StoreError::not_found("revision", name).into())
    }

    /// First parent of the commit `oid` names, peeling annotated tags
    fn first_parent(oid: ObjectId, repository: &Repository) -> anyhow::Result<ObjectId> {
        let commit_oid = Self::peel(oid, ObjectType::Commit, repository)?;
        let commit = repository.database().parse_object_as_commit(&commit_oid)?;

        commit
            .parent()
            .cloned()
            .with_context(|| format!("commit {} has no parent", commit_oid.to_short_oid()))
    }

    /// Follow tag objects from `oid` until reaching an object of kind `target`
    pub fn peel(
        mut oid: ObjectId,
        target: ObjectType,
        repository: &Repository,
    ) -> anyhow::Result<ObjectId> {
        loop {
            match repository.database().parse_object(&oid)? {
                object if object.object_type() == target => return Ok(oid),
                ObjectBox::Tag(tag) => oid = tag.target().clone(),
                ObjectBox::Commit(commit) if target == ObjectType::Tree => {
                    oid = commit.tree_oid().clone()
                }
                object => {
                    return Err(StoreError::TypeMismatch {
                        oid: oid.to_string(),
                        expected: target.to_string(),
                        actual: object.object_type().to_string(),
                    }
                    .into());
                }
            }
        }
    }
}
