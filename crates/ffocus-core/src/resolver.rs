#![forbid(unsafe_code)]

//! Target resolution.
//!
//! Maps an [`Intent`] to an absolute position in a [`Snapshot`]. A miss is
//! reported as [`Resolution::NotFound`], which is a normal value: the first
//! snapshot after a fast mutation frequently predates the mutation, because
//! the fetch and the refetch are not ordered relative to each other.
//!
//! # Rules
//!
//! - **Update**: linear scan for the id.
//! - **Create**: scan for the correlation key, then bind the found id into
//!   the intent so later lookups take the id path.
//! - **Delete** (evaluated after the delete took effect): the deleted id must
//!   be absent, otherwise the snapshot is stale. The captured neighbor is
//!   looked up next; if it vanished too, fall back to
//!   `clamp(neighbor_index - 1, 0, len - 1)`.
//!
//! Resolution is idempotent: resolving the same intent against the same
//! snapshot twice yields the same result (the create binding only switches
//! the lookup path, not the answer).

use crate::intent::Intent;
use crate::record::Record;
use crate::snapshot::Snapshot;

/// Outcome of resolving an intent against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<I> {
    /// The record to focus and its absolute index.
    Found {
        /// Absolute index in the snapshot.
        index: usize,
        /// Identifier of the record to focus.
        id: I,
    },
    /// The snapshot does not (yet) reflect the mutation.
    NotFound,
}

impl<I> Resolution<I> {
    /// Whether the resolution found a target.
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Absolute index, if found.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Found { index, .. } => Some(*index),
            Self::NotFound => None,
        }
    }
}

/// Locate a record by id.
///
/// Used for updates and for pre-delete lookups.
pub fn locate<R: Record>(snapshot: &Snapshot<R>, id: &R::Id) -> Resolution<R::Id> {
    match snapshot.position_of(id) {
        Some(index) => Resolution::Found {
            index,
            id: id.clone(),
        },
        None => Resolution::NotFound,
    }
}

/// Resolve `intent` against `snapshot`.
///
/// `key_of` extracts the correlation key from a record; it is only consulted
/// for create intents that have no bound id yet.
pub fn resolve<R, K, F>(
    snapshot: &Snapshot<R>,
    intent: &mut Intent<R::Id, K>,
    key_of: F,
) -> Resolution<R::Id>
where
    R: Record,
    K: PartialEq,
    F: Fn(&R) -> K,
{
    let resolution = match intent {
        Intent::Update { id } => locate(snapshot, id),
        Intent::Create {
            id: Some(bound), ..
        } => locate(snapshot, bound),
        Intent::Create {
            correlation_key,
            id,
        } => {
            let found = snapshot
                .records()
                .iter()
                .position(|r| key_of(r) == *correlation_key);
            match found {
                Some(index) => {
                    let found_id = snapshot.records()[index].id().clone();
                    *id = Some(found_id.clone());
                    Resolution::Found {
                        index,
                        id: found_id,
                    }
                }
                None => Resolution::NotFound,
            }
        }
        Intent::Delete { id, preceding } => resolve_after_delete(snapshot, id, preceding.as_ref()),
    };

    #[cfg(feature = "tracing")]
    tracing::trace!(
        kind = intent.kind().as_str(),
        generation = snapshot.generation(),
        len = snapshot.len(),
        found = resolution.is_found(),
        "resolve"
    );

    resolution
}

fn resolve_after_delete<R: Record>(
    snapshot: &Snapshot<R>,
    deleted: &R::Id,
    preceding: Option<&crate::successor::Successor<R::Id>>,
) -> Resolution<R::Id> {
    if snapshot.contains(deleted) {
        // Refetch predates the delete.
        return Resolution::NotFound;
    }
    if let Some(neighbor) = preceding {
        if let Some(index) = snapshot.position_of(&neighbor.id) {
            return Resolution::Found {
                index,
                id: neighbor.id.clone(),
            };
        }
    }
    if snapshot.is_empty() {
        return Resolution::NotFound;
    }
    let base = preceding.map_or(0, |n| n.index);
    let index = base.saturating_sub(1).min(snapshot.len() - 1);
    Resolution::Found {
        index,
        id: snapshot.records()[index].id().clone(),
    }
}
