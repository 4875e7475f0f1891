#![forbid(unsafe_code)]

//! Mutation intents.
//!
//! An [`Intent`] is the caller's request to focus a specific (possibly
//! not-yet-identified) record after a mutation. Intents are created when
//! the mutation is dispatched and live until resolved or expired.

use std::fmt;

use crate::successor::Successor;

/// The kind of mutation an intent reconciles.
///
/// At most one live intent exists per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationKind {
    /// A record was added.
    Create,
    /// A record was edited.
    Update,
    /// A record was removed.
    Delete,
}

impl MutationKind {
    /// All kinds, in evaluation order.
    pub const ALL: [MutationKind; 3] = [Self::Create, Self::Update, Self::Delete];

    /// Dense index for per-kind tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Create => 0,
            Self::Update => 1,
            Self::Delete => 2,
        }
    }

    /// Short lowercase name, used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending request to focus a record after a mutation.
///
/// `I` is the record identifier; `K` is the correlation key type used to
/// find a freshly created record before its server-assigned id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent<I, K> {
    /// Focus a newly created record.
    Create {
        /// Caller-known field echoed back by the server.
        correlation_key: K,
        /// Bound once the record has been found (or reported by the
        /// mutation result); later lookups use the id path.
        id: Option<I>,
    },
    /// Focus an edited record.
    Update {
        /// Record identifier.
        id: I,
    },
    /// Focus the neighbor of a deleted record.
    Delete {
        /// Identifier of the record being deleted.
        id: I,
        /// Neighbor captured from the pre-delete snapshot.
        preceding: Option<Successor<I>>,
    },
}

impl<I, K> Intent<I, K> {
    /// Create intent for a record not yet identified.
    pub fn create(correlation_key: K) -> Self {
        Self::Create {
            correlation_key,
            id: None,
        }
    }

    /// Update intent.
    pub fn update(id: I) -> Self {
        Self::Update { id }
    }

    /// Delete intent with the neighbor captured before dispatch.
    pub fn delete(id: I, preceding: Option<Successor<I>>) -> Self {
        Self::Delete { id, preceding }
    }

    /// The mutation kind this intent reconciles.
    #[must_use]
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }

    /// The identifier of the mutated record, if known.
    ///
    /// For deletes this is the removed record, not the focus target.
    pub fn id(&self) -> Option<&I> {
        match self {
            Self::Create { id, .. } => id.as_ref(),
            Self::Update { id } | Self::Delete { id, .. } => Some(id),
        }
    }

    /// Bind a server-assigned id to a create intent.
    ///
    /// Returns `false` (and leaves the intent untouched) for other kinds.
    pub fn bind_id(&mut self, new_id: I) -> bool {
        match self {
            Self::Create { id, .. } => {
                *id = Some(new_id);
                true
            }
            _ => false,
        }
    }
}
