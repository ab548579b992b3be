//! Many-to-many relation reconciliation.
//!
//! [`reconcile`] makes a store's member set equal a desired collection by
//! removing `current - desired` and then adding `desired - current`.
//! Members present on both sides are never touched.
//!
//! A store failure is returned as-is and nothing already applied is undone;
//! callers that need all-or-nothing semantics wrap the call in their own
//! transaction, as [`set_user_tags`] does. Concurrent reconciles against the
//! same owner are not serialized here.

use std::collections::HashSet;
use std::hash::Hash;

use kb_core::{Error, Result, TagId, UserId};
use rusqlite::Connection;

use crate::queries::{tags, users};

/// A persisted set of members linked to one owner.
pub trait RelationStore {
    /// Opaque member identifier.
    type Member: Eq + Hash + Clone;

    /// Current members.
    fn members(&self) -> Result<HashSet<Self::Member>>;

    /// Link the given members.
    fn add(&mut self, members: &[Self::Member]) -> Result<()>;

    /// Unlink the given members.
    fn remove(&mut self, members: &[Self::Member]) -> Result<()>;
}

/// The changes applied by one [`reconcile`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDelta<M> {
    /// Members linked, in first-seen order of the desired collection.
    pub added: Vec<M>,
    /// Members unlinked, in no particular order.
    pub removed: Vec<M>,
}

impl<M> RelationDelta<M> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Make `store` contain exactly the members of `desired`.
///
/// Duplicates in `desired` collapse to a single membership. Removals are
/// applied before additions and empty batches are skipped.
pub fn reconcile<S, I>(store: &mut S, desired: I) -> Result<RelationDelta<S::Member>>
where
    S: RelationStore,
    I: IntoIterator<Item = S::Member>,
{
    let current = store.members()?;

    let mut wanted = HashSet::new();
    let mut added = Vec::new();
    for member in desired {
        if wanted.insert(member.clone()) && !current.contains(&member) {
            added.push(member);
        }
    }
    let removed: Vec<_> = current.difference(&wanted).cloned().collect();

    if !removed.is_empty() {
        store.remove(&removed)?;
    }
    if !added.is_empty() {
        store.add(&added)?;
    }

    Ok(RelationDelta { added, removed })
}

impl<M: Eq + Hash + Clone> RelationStore for HashSet<M> {
    type Member = M;

    fn members(&self) -> Result<HashSet<M>> {
        Ok(self.clone())
    }

    fn add(&mut self, members: &[M]) -> Result<()> {
        self.extend(members.iter().cloned());
        Ok(())
    }

    fn remove(&mut self, members: &[M]) -> Result<()> {
        for member in members {
            HashSet::remove(self, member);
        }
        Ok(())
    }
}

/// The tags linked to one user through `user_tags`.
pub struct UserTags<'c> {
    conn: &'c Connection,
    user_id: UserId,
}

impl<'c> UserTags<'c> {
    pub fn new(conn: &'c Connection, user_id: UserId) -> Self {
        Self { conn, user_id }
    }
}

impl RelationStore for UserTags<'_> {
    type Member = TagId;

    fn members(&self) -> Result<HashSet<TagId>> {
        tags::user_tag_ids(self.conn, self.user_id)
    }

    fn add(&mut self, members: &[TagId]) -> Result<()> {
        tags::add_user_tags(self.conn, self.user_id, members)
    }

    fn remove(&mut self, members: &[TagId]) -> Result<()> {
        tags::remove_user_tags(self.conn, self.user_id, members).map(|_| ())
    }
}

/// Replace a user's tags with `desired` inside a single transaction.
///
/// Either the whole delta is applied or, on any failure, none of it is.
pub fn set_user_tags(
    conn: &Connection,
    user_id: UserId,
    desired: &[TagId],
) -> Result<RelationDelta<TagId>> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    if users::get_user(&tx, user_id)?.is_none() {
        return Err(Error::not_found("user", user_id));
    }

    let delta = reconcile(&mut UserTags::new(&tx, user_id), desired.iter().copied())?;
    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    tracing::info!(
        %user_id,
        added = delta.added.len(),
        removed = delta.removed.len(),
        "reconciled user tags"
    );
    Ok(delta)
}
