//! Commit construction
//!
//! Turns a tree id plus ancestry and identity into a stored commit. The
//! writer never moves a branch pointer; publishing the new id is left to
//! the caller.

use crate::areas::database::Database;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{StoreError, StoreResult};
use std::collections::HashSet;

#[derive(Debug)]
pub struct CommitWriter<'d> {
    database: &'d Database,
}

impl<'d> CommitWriter<'d> {
    pub fn new(database: &'d Database) -> Self {
        CommitWriter { database }
    }

    /// Store a commit of `tree_oid` with the given parents and return its id
    ///
    /// The tree and every parent must already be stored: a missing id fails
    /// `DanglingReference`, an id of the wrong kind fails `TypeMismatch`, and
    /// a parent listed twice fails `InvalidFormat`. An empty parent list
    /// makes a root commit.
    pub fn create(
        &self,
        tree_oid: &ObjectId,
        parents: &[ObjectId],
        author: Author,
        committer: Author,
        message: &str,
    ) -> StoreResult<ObjectId> {
        self.expect_object(tree_oid, "tree", ObjectType::Tree)?;

        let mut seen = HashSet::new();
        for parent in parents {
            if !seen.insert(parent) {
                return Err(StoreError::InvalidFormat(format!(
                    "parent {parent} is listed more than once"
                )));
            }
            self.expect_object(parent, "parent", ObjectType::Commit)?;
        }

        let commit = Commit::new(
            parents.to_vec(),
            tree_oid.clone(),
            author,
            committer,
            message.to_string(),
        );

        self.database.store(&commit)
    }

    fn expect_object(
        &self,
        oid: &ObjectId,
        kind: &'static str,
        expected: ObjectType,
    ) -> StoreResult<()> {
        if !self.database.exists(oid) {
            return Err(StoreError::DanglingReference {
                kind,
                oid: oid.to_string(),
            });
        }

        let actual = self.database.object_type(oid)?;
        if actual != expected {
            return Err(StoreError::TypeMismatch {
                oid: oid.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(())
    }
}
