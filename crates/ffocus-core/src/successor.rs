#![forbid(unsafe_code)]

//! Delete successor selection.
//!
//! Runs against the *pre-delete* snapshot, before the delete is dispatched,
//! and captures the neighbor that should receive focus once the deleted
//! record is gone.
//!
//! # Policy
//!
//! | Target position | Successor           |
//! |-----------------|---------------------|
//! | `i > 0`         | record at `i - 1`   |
//! | `i == 0`, len>1 | record at `1`       |
//! | only record     | none                |
//!
//! Deleting the first element focuses the element that becomes the new
//! first element rather than reaching for a negative index.

use crate::record::Record;
use crate::snapshot::Snapshot;

/// The neighbor captured before a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Successor<I> {
    /// Neighbor identifier.
    pub id: I,
    /// Neighbor's absolute index in the pre-delete snapshot.
    pub index: usize,
}

/// Pick the record that should take focus after `target` is deleted.
///
/// Returns `None` when the target is the only record (the collection will be
/// empty) or when the target is not in the snapshot at all.
#[must_use]
pub fn select_successor<R: Record>(
    snapshot: &Snapshot<R>,
    target: &R::Id,
) -> Option<Successor<R::Id>> {
    let i = snapshot.position_of(target)?;
    let index = if i > 0 {
        i - 1
    } else if snapshot.len() > 1 {
        1
    } else {
        return None;
    };
    snapshot.get(index).map(|r| Successor {
        id: r.id().clone(),
        index,
    })
}
