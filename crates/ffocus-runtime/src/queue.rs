#![forbid(unsafe_code)]

//! Reconciliation request queue.
//!
//! Holds at most one pending [`Intent`] per [`MutationKind`] and runs the
//! per-kind state machine:
//!
//! ```text
//!          request            Found
//!   Idle ───────────▶ Pending ──────▶ Resolved
//!                      │   ▲
//!          NotFound,   │   │
//!          budget left └───┘
//!                      │
//!                      └────────────▶ Expired
//!            budget or deadline exhausted
//! ```
//!
//! The queue never polls. It is evaluated when a snapshot arrives
//! ([`RequestQueue::observe`]) and when the host delivers a tick
//! ([`RequestQueue::expire_overdue`]); the retry budget is counted in
//! snapshots observed, and the wall-clock deadline is a non-renewing
//! ceiling. A newer intent of the same kind supersedes the older one
//! outright.

use std::fmt::Debug;

use ffocus_core::{Intent, MutationKind, Record, Resolution, Snapshot, resolve};
use tracing::debug;
use web_time::{Duration, Instant};

/// Explicit per-kind request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestState {
    /// No request has been made, or the last one was cancelled.
    #[default]
    Idle,
    /// Waiting for a snapshot that reflects the mutation.
    Pending,
    /// The last request found its target; nothing is retained.
    Resolved,
    /// The last request ran out of budget; nothing is retained.
    Expired,
}

/// Why a request expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireReason {
    /// Observed `max_snapshots` snapshots without resolving.
    SnapshotBudget,
    /// The wall-clock deadline passed.
    Deadline,
}

/// Outcome of evaluating one pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<I, K> {
    /// The request resolved; the intent is handed back (with any bound id).
    Resolved {
        /// Request kind.
        kind: MutationKind,
        /// Absolute index of the focus target.
        index: usize,
        /// Focus target.
        id: I,
        /// The resolved intent.
        intent: Intent<I, K>,
        /// Snapshots observed, including this one.
        attempts: u32,
    },
    /// Still pending.
    Waiting {
        /// Request kind.
        kind: MutationKind,
        /// Snapshots observed so far.
        attempts: u32,
    },
    /// The request was dropped.
    Expired {
        /// Request kind.
        kind: MutationKind,
        /// Why.
        reason: ExpireReason,
    },
}

#[derive(Debug)]
struct PendingRequest<I, K> {
    intent: Intent<I, K>,
    attempts: u32,
    deadline: Instant,
}

#[derive(Debug)]
struct Slot<I, K> {
    state: RequestState,
    pending: Option<PendingRequest<I, K>>,
}

impl<I, K> Default for Slot<I, K> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            pending: None,
        }
    }
}

/// One slot per mutation kind.
#[derive(Debug)]
pub struct RequestQueue<I, K> {
    slots: [Slot<I, K>; 3],
    max_snapshots: u32,
    deadline: Duration,
}

impl<I, K> RequestQueue<I, K>
where
    I: Clone + Eq + Debug,
    K: PartialEq + Debug,
{
    /// Create an empty queue with the given budget. A zero `max_snapshots`
    /// is raised to 1.
    pub fn new(max_snapshots: u32, deadline: Duration) -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::default()),
            max_snapshots: max_snapshots.max(1),
            deadline,
        }
    }

    /// Record `intent` as pending. Returns the superseded intent of the same
    /// kind, if one was pending.
    pub fn request(&mut self, intent: Intent<I, K>, now: Instant) -> Option<Intent<I, K>> {
        let kind = intent.kind();
        let slot = &mut self.slots[kind.index()];
        let superseded = slot.pending.take().map(|p| p.intent);
        if let Some(old) = &superseded {
            debug!(kind = kind.as_str(), old = ?old, "request superseded");
        }
        debug!(kind = kind.as_str(), intent = ?intent, "request pending");
        slot.pending = Some(PendingRequest {
            intent,
            attempts: 0,
            deadline: now + self.deadline,
        });
        slot.state = RequestState::Pending;
        superseded
    }

    /// Drop the pending request for `kind`. Returns whether one was pending.
    pub fn cancel(&mut self, kind: MutationKind) -> bool {
        let slot = &mut self.slots[kind.index()];
        let had = slot.pending.take().is_some();
        if had {
            debug!(kind = kind.as_str(), "request cancelled");
            slot.state = RequestState::Idle;
        }
        had
    }

    /// Bind a server-reported id to the pending create request.
    pub fn bind_created_id(&mut self, id: I) -> bool {
        match &mut self.slots[MutationKind::Create.index()].pending {
            Some(p) => p.intent.bind_id(id),
            None => false,
        }
    }

    /// Evaluate every pending request against a newly arrived snapshot.
    ///
    /// Kinds are evaluated in [`MutationKind::ALL`] order and independently
    /// of each other.
    pub fn observe<R, F>(
        &mut self,
        snapshot: &Snapshot<R>,
        now: Instant,
        key_of: F,
    ) -> Vec<Observation<I, K>>
    where
        R: Record<Id = I>,
        F: Fn(&R) -> K,
    {
        let mut out = Vec::new();
        for kind in MutationKind::ALL {
            let slot = &mut self.slots[kind.index()];
            let Some(pending) = slot.pending.as_mut() else {
                continue;
            };

            if now >= pending.deadline {
                slot.pending = None;
                slot.state = RequestState::Expired;
                debug!(kind = kind.as_str(), "request expired at deadline");
                out.push(Observation::Expired {
                    kind,
                    reason: ExpireReason::Deadline,
                });
                continue;
            }

            pending.attempts += 1;
            match resolve(snapshot, &mut pending.intent, &key_of) {
                Resolution::Found { index, id } => {
                    let attempts = pending.attempts;
                    let Some(done) = slot.pending.take() else {
                        continue;
                    };
                    slot.state = RequestState::Resolved;
                    debug!(
                        kind = kind.as_str(),
                        index,
                        attempts,
                        generation = snapshot.generation(),
                        params = %snapshot.params(),
                        "request resolved"
                    );
                    out.push(Observation::Resolved {
                        kind,
                        index,
                        id,
                        intent: done.intent,
                        attempts,
                    });
                }
                Resolution::NotFound if pending.attempts >= self.max_snapshots => {
                    slot.pending = None;
                    slot.state = RequestState::Expired;
                    debug!(
                        kind = kind.as_str(),
                        budget = self.max_snapshots,
                        "request expired: snapshot budget exhausted"
                    );
                    out.push(Observation::Expired {
                        kind,
                        reason: ExpireReason::SnapshotBudget,
                    });
                }
                Resolution::NotFound => {
                    out.push(Observation::Waiting {
                        kind,
                        attempts: pending.attempts,
                    });
                }
            }
        }
        out
    }

    /// Expire requests whose deadline has passed. Returns the expired kinds.
    pub fn expire_overdue(&mut self, now: Instant) -> Vec<MutationKind> {
        let mut expired = Vec::new();
        for kind in MutationKind::ALL {
            let slot = &mut self.slots[kind.index()];
            let overdue = slot.pending.as_ref().is_some_and(|p| now >= p.deadline);
            if overdue {
                slot.pending = None;
                slot.state = RequestState::Expired;
                debug!(kind = kind.as_str(), "request expired at deadline");
                expired.push(kind);
            }
        }
        expired
    }

    /// Current state tag for `kind`.
    pub fn state(&self, kind: MutationKind) -> RequestState {
        self.slots[kind.index()].state
    }

    /// Whether `kind` has a pending request.
    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.slots[kind.index()].pending.is_some()
    }

    /// The pending intent for `kind`.
    pub fn pending(&self, kind: MutationKind) -> Option<&Intent<I, K>> {
        self.slots[kind.index()].pending.as_ref().map(|p| &p.intent)
    }

    /// Snapshots observed by the pending request for `kind`.
    pub fn attempts(&self, kind: MutationKind) -> Option<u32> {
        self.slots[kind.index()].pending.as_ref().map(|p| p.attempts)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .filter_map(|s| s.pending.as_ref().map(|p| p.deadline))
            .min()
    }
}
