#![forbid(unsafe_code)]

//! Deferred re-checks for resolved targets the surface cannot take yet.
//!
//! A request can resolve while the navigation driver is still waiting on a
//! page change, or before the surface has a page size. Rather than retrying
//! on fixed ad hoc timers, the target is parked here with a capped number of
//! re-checks at a fixed spacing. When a re-check comes due, the engine
//! re-resolves the intent against the *latest* snapshot (positions may have
//! moved) and tries to navigate again.
//!
//! This is the only time-driven retry in the engine, and it exists solely to
//! absorb the surface's own settling delay. Resolution retries are driven by
//! snapshot arrival in [`RequestQueue`](crate::queue::RequestQueue).

use ffocus_core::{Intent, MutationKind};
use tracing::debug;
use web_time::{Duration, Instant};

#[derive(Debug)]
struct Parked<I, K> {
    intent: Intent<I, K>,
    rechecks_left: u32,
    due_at: Instant,
}

/// A parked target that has come due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueRecheck<I, K> {
    /// Kind of the parked request.
    pub kind: MutationKind,
    /// The resolved intent, with any bound id.
    pub intent: Intent<I, K>,
    /// Re-checks remaining after this one.
    pub rechecks_left: u32,
}

/// Outcome of parking a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkOutcome {
    /// Parked; will come due at the given instant.
    Parked(Instant),
    /// No re-check budget left; the target was dropped.
    Dropped,
}

/// Per-kind deferred re-check slots.
#[derive(Debug)]
pub struct RetryScheduler<I, K> {
    slots: [Option<Parked<I, K>>; 3],
    max_rechecks: u32,
    interval: Duration,
}

impl<I: std::fmt::Debug, K: std::fmt::Debug> RetryScheduler<I, K> {
    /// Create a scheduler allowing `max_rechecks` re-checks spaced by
    /// `interval`.
    pub fn new(max_rechecks: u32, interval: Duration) -> Self {
        Self {
            slots: [None, None, None],
            max_rechecks,
            interval,
        }
    }

    /// Park a freshly resolved target with the full re-check budget.
    pub fn park(&mut self, intent: Intent<I, K>, now: Instant) -> ParkOutcome {
        self.park_with(intent, self.max_rechecks, now)
    }

    /// Park a target that came due and still could not navigate.
    pub fn repark(&mut self, due: DueRecheck<I, K>, now: Instant) -> ParkOutcome {
        self.park_with(due.intent, due.rechecks_left, now)
    }

    fn park_with(&mut self, intent: Intent<I, K>, budget: u32, now: Instant) -> ParkOutcome {
        let kind = intent.kind();
        if budget == 0 {
            self.slots[kind.index()] = None;
            debug!(kind = kind.as_str(), "re-check budget exhausted; dropping target");
            return ParkOutcome::Dropped;
        }
        let due_at = now + self.interval;
        debug!(kind = kind.as_str(), rechecks_left = budget, "target parked");
        self.slots[kind.index()] = Some(Parked {
            intent,
            rechecks_left: budget,
            due_at,
        });
        ParkOutcome::Parked(due_at)
    }

    /// Take every parked target whose re-check is due, consuming one
    /// re-check each.
    pub fn take_due(&mut self, now: Instant) -> Vec<DueRecheck<I, K>> {
        let mut due = Vec::new();
        for kind in MutationKind::ALL {
            let slot = &mut self.slots[kind.index()];
            if slot.as_ref().is_some_and(|p| now >= p.due_at) {
                if let Some(p) = slot.take() {
                    due.push(DueRecheck {
                        kind,
                        intent: p.intent,
                        rechecks_left: p.rechecks_left - 1,
                    });
                }
            }
        }
        due
    }

    /// Drop the parked target for `kind`.
    pub fn cancel(&mut self, kind: MutationKind) -> bool {
        self.slots[kind.index()].take().is_some()
    }

    /// Whether `kind` has a parked target.
    pub fn is_parked(&self, kind: MutationKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Earliest due time.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|p| p.due_at).min()
    }
}
