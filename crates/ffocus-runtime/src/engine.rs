#![forbid(unsafe_code)]

//! Message-driven reconciliation engine.
//!
//! [`Engine`] composes the request queue, the retry scheduler, the
//! navigation driver, and the highlight timer behind a single
//! [`Engine::update`] entry point. Every external event is an inbound
//! [`Msg`]; every reaction runs to completion inside `update`, on the
//! caller's thread. There is no other suspension point.
//!
//! # Example
//!
//! ```ignore
//! use ffocus_runtime::{Engine, Msg, ReconcileConfig};
//! use ffocus_core::Intent;
//!
//! let mut engine = Engine::new(ReconcileConfig::default(), |c: &Country| c.code.clone());
//!
//! // Before dispatching the delete, capture the neighbor.
//! let intent = engine.prepare_delete(&country_id);
//! engine.update(Msg::Request(intent), now, &mut table);
//!
//! // Later, as the data layer refetches:
//! let wake_at = engine.update(Msg::SnapshotReplaced(snapshot), now, &mut table);
//! // ...and as the table acknowledges page changes:
//! engine.update(Msg::PageChanged(1), now, &mut table);
//! // Schedule a Msg::Tick at `wake_at`, if any.
//! ```
//!
//! # Failure modes
//!
//! Nothing here returns an error or panics on behalf of the surface. A
//! request that never resolves expires silently; a missed page
//! acknowledgment proceeds anyway; a failed upstream mutation cancels its
//! request. All of them degrade to "no navigation occurs".

use std::fmt::Debug;

use ffocus_core::{
    Intent, MutationKind, Record, Resolution, Snapshot, ViewportCursor, resolve, select_successor,
};
use tracing::debug;
use web_time::Instant;

use crate::config::{ConfigError, ReconcileConfig};
use crate::highlight::{HighlightChange, HighlightSubscription, HighlightTimer};
use crate::navigation::{NavStep, NavigationDriver, PageWaitEnd};
use crate::queue::{Observation, RequestQueue, RequestState};
use crate::scheduler::{DueRecheck, ParkOutcome, RetryScheduler};
use crate::surface::ViewSurface;

/// Result reported by the data layer when a mutation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<I> {
    /// The remote store accepted the mutation. For creates, `id` carries the
    /// server-assigned identifier when the response includes it.
    Succeeded {
        /// Server-assigned id, if reported.
        id: Option<I>,
    },
    /// The remote store rejected the mutation.
    Failed,
}

/// Inbound messages.
#[derive(Debug)]
pub enum Msg<R: Record, K> {
    /// Record a reconciliation intent (at mutation dispatch).
    Request(Intent<R::Id, K>),
    /// Drop the request and highlight for a kind.
    Cancel(MutationKind),
    /// Drop every request, parked target, highlight, and page wait.
    CancelAll,
    /// A mutation settled upstream.
    MutationSettled {
        /// Kind of the settled mutation.
        kind: MutationKind,
        /// Result.
        outcome: MutationOutcome<R::Id>,
    },
    /// The data layer replaced the collection snapshot.
    SnapshotReplaced(Snapshot<R>),
    /// The surface acknowledged a page change.
    PageChanged(usize),
    /// Time advanced; process due timers.
    Tick,
}

/// Engine counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Intents recorded.
    pub requested: u64,
    /// Intents replaced by a newer intent of the same kind.
    pub superseded: u64,
    /// Explicit or failure-driven cancellations.
    pub cancelled: u64,
    /// Requests that found their target.
    pub resolved: u64,
    /// Requests dropped by budget or deadline.
    pub expired: u64,
    /// Navigations that issued select + scroll.
    pub navigations: u64,
    /// Page waits that ended by timeout.
    pub ack_timeouts: u64,
    /// Resolved targets parked for a re-check.
    pub deferred: u64,
    /// Parked targets dropped without navigating.
    pub deferred_dropped: u64,
}

/// A navigation waiting on a page change, with the intent that produced it.
struct InFlight<I, K> {
    kind: MutationKind,
    intent: Intent<I, K>,
}

/// The reconciliation engine for one list view.
pub struct Engine<R: Record, K> {
    config: ReconcileConfig,
    snapshot: Snapshot<R>,
    key_of: Box<dyn Fn(&R) -> K>,
    queue: RequestQueue<R::Id, K>,
    scheduler: RetryScheduler<R::Id, K>,
    driver: NavigationDriver<R::Id>,
    in_flight: Option<InFlight<R::Id, K>>,
    highlight: HighlightTimer<R::Id>,
    cursor: Option<ViewportCursor<R::Id>>,
    stats: ReconcileStats,
}

impl<R: Record, K> Debug for Engine<R, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("snapshot", &self.snapshot)
            .field("in_flight", &self.in_flight.as_ref().map(|f| f.kind))
            .field("cursor", &self.cursor)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<R, K> Engine<R, K>
where
    R: Record,
    R::Id: 'static,
    K: PartialEq + Debug,
{
    /// Create an engine.
    ///
    /// `key_of` extracts the correlation key used to find created records
    /// before their id is known. `config` is taken as given; a zero
    /// `max_snapshots` behaves as 1. Use [`Engine::try_new`] to reject
    /// invalid policies instead.
    pub fn new(config: ReconcileConfig, key_of: impl Fn(&R) -> K + 'static) -> Self {
        Self {
            queue: RequestQueue::new(config.max_snapshots, config.deadline_duration()),
            scheduler: RetryScheduler::new(config.settle_rechecks, config.settle_interval()),
            driver: NavigationDriver::new(config.page_ack_duration()),
            highlight: HighlightTimer::new(config.highlight_duration()),
            config,
            snapshot: Snapshot::empty(),
            key_of: Box::new(key_of),
            in_flight: None,
            cursor: None,
            stats: ReconcileStats::default(),
        }
    }

    /// Create an engine after validating `config`.
    pub fn try_new(
        config: ReconcileConfig,
        key_of: impl Fn(&R) -> K + 'static,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.validated()?, key_of))
    }

    /// Seed the engine with the snapshot that is current at startup.
    ///
    /// Unlike [`Msg::SnapshotReplaced`], this does not evaluate pending
    /// requests.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Snapshot<R>) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Process one inbound message.
    ///
    /// Returns the next instant at which the engine wants a [`Msg::Tick`],
    /// if any timer is armed.
    pub fn update<S: ViewSurface<R::Id>>(
        &mut self,
        msg: Msg<R, K>,
        now: Instant,
        surface: &mut S,
    ) -> Option<Instant> {
        match msg {
            Msg::Request(intent) => self.request_reconciliation(intent, now),
            Msg::Cancel(kind) => self.cancel_reconciliation(kind),
            Msg::CancelAll => self.cancel_all(),
            Msg::MutationSettled { kind, outcome } => self.on_settled(kind, outcome),
            Msg::SnapshotReplaced(snapshot) => self.on_snapshot(snapshot, now, surface),
            Msg::PageChanged(page) => self.on_page_changed(page, surface),
            Msg::Tick => self.on_tick(now, surface),
        }
        self.next_deadline()
    }

    /// Record `intent`, superseding any live intent of the same kind along
    /// with its parked target, highlight, and page wait.
    pub fn request_reconciliation(&mut self, intent: Intent<R::Id, K>, now: Instant) {
        let kind = intent.kind();
        self.stats.requested += 1;
        let parked = self.scheduler.cancel(kind);
        let waiting = self.abort_in_flight(kind);
        if self.queue.request(intent, now).is_some() || parked || waiting {
            self.stats.superseded += 1;
        }
        self.highlight.cancel(kind);
    }

    /// Drop the request, parked target, highlight, and page wait for `kind`.
    pub fn cancel_reconciliation(&mut self, kind: MutationKind) {
        let pending = self.queue.cancel(kind);
        let parked = self.scheduler.cancel(kind);
        let waiting = self.abort_in_flight(kind);
        self.highlight.cancel(kind);
        if pending || parked || waiting {
            self.stats.cancelled += 1;
        }
    }

    /// Cancel every kind.
    pub fn cancel_all(&mut self) {
        for kind in MutationKind::ALL {
            self.cancel_reconciliation(kind);
        }
    }

    /// Build a delete intent for `id`, capturing its neighbor from the
    /// current snapshot. Call this *before* dispatching the delete.
    pub fn prepare_delete(&self, id: &R::Id) -> Intent<R::Id, K> {
        Intent::delete(id.clone(), select_successor(&self.snapshot, id))
    }

    /// The record currently highlighted for `kind`.
    pub fn highlight(&self, kind: MutationKind) -> Option<R::Id> {
        self.highlight.active(kind).map(|e| e.id.clone())
    }

    /// Call `listener` on every highlight transition, for any kind, until
    /// the returned subscription is dropped.
    pub fn on_highlight_changed(
        &self,
        listener: impl Fn(&HighlightChange<R::Id>) + 'static,
    ) -> HighlightSubscription {
        self.highlight.subscribe(listener)
    }

    /// The explicit state tag for `kind`.
    pub fn state(&self, kind: MutationKind) -> RequestState {
        self.queue.state(kind)
    }

    /// The pending intent for `kind`, if any.
    pub fn pending(&self, kind: MutationKind) -> Option<&Intent<R::Id, K>> {
        self.queue.pending(kind)
    }

    /// The cursor of the last completed navigation.
    pub fn cursor(&self) -> Option<&ViewportCursor<R::Id>> {
        self.cursor.as_ref()
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &Snapshot<R> {
        &self.snapshot
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    /// Active configuration.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Whether a navigation is waiting on a page change.
    pub fn is_navigating(&self) -> bool {
        self.driver.is_busy()
    }

    /// Earliest armed timer across all components.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.queue.next_deadline(),
            self.scheduler.next_deadline(),
            self.driver.next_deadline(),
            self.highlight.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn on_settled(&mut self, kind: MutationKind, outcome: MutationOutcome<R::Id>) {
        match outcome {
            MutationOutcome::Failed => {
                debug!(kind = kind.as_str(), "mutation failed upstream");
                self.cancel_reconciliation(kind);
            }
            MutationOutcome::Succeeded { id: Some(id) } if kind == MutationKind::Create => {
                if self.queue.bind_created_id(id) {
                    debug!("bound server-assigned id to pending create");
                }
            }
            MutationOutcome::Succeeded { .. } => {}
        }
    }

    fn on_snapshot<S: ViewSurface<R::Id>>(
        &mut self,
        snapshot: Snapshot<R>,
        now: Instant,
        surface: &mut S,
    ) {
        self.snapshot = snapshot;
        self.follow_in_flight(now, surface);

        let key_of = &self.key_of;
        let observations = self.queue.observe(&self.snapshot, now, |r| key_of(r));
        for obs in observations {
            match obs {
                Observation::Resolved {
                    kind,
                    index,
                    id,
                    intent,
                    ..
                } => {
                    self.stats.resolved += 1;
                    self.highlight.start(kind, id.clone(), now);
                    self.try_navigate(kind, index, id, intent, None, now, surface);
                }
                Observation::Expired { .. } => self.stats.expired += 1,
                Observation::Waiting { .. } => {}
            }
        }
    }

    fn on_page_changed<S: ViewSurface<R::Id>>(&mut self, page: usize, surface: &mut S) {
        if let Some((cursor, end)) = self.driver.on_page_changed(page, surface) {
            self.finish_navigation(cursor, end);
        }
    }

    fn on_tick<S: ViewSurface<R::Id>>(&mut self, now: Instant, surface: &mut S) {
        if let Some((cursor, end)) = self.driver.on_tick(now, surface) {
            self.finish_navigation(cursor, end);
        }

        self.stats.expired += self.queue.expire_overdue(now).len() as u64;
        self.highlight.on_tick(now);

        for due in self.scheduler.take_due(now) {
            let DueRecheck {
                kind,
                mut intent,
                rechecks_left,
            } = due;
            let key_of = &self.key_of;
            match resolve(&self.snapshot, &mut intent, |r| key_of(r)) {
                Resolution::Found { index, id } => {
                    self.try_navigate(kind, index, id, intent, Some(rechecks_left), now, surface);
                }
                Resolution::NotFound => {
                    debug!(kind = kind.as_str(), "parked target left the snapshot");
                    self.stats.deferred_dropped += 1;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_navigate<S: ViewSurface<R::Id>>(
        &mut self,
        kind: MutationKind,
        index: usize,
        id: R::Id,
        intent: Intent<R::Id, K>,
        rechecks_left: Option<u32>,
        now: Instant,
        surface: &mut S,
    ) {
        match self.driver.navigate(index, id, surface, now) {
            NavStep::Completed(cursor) => self.finish_navigation(cursor, PageWaitEnd::Acknowledged),
            NavStep::AwaitingPage(_) => self.in_flight = Some(InFlight { kind, intent }),
            NavStep::Busy | NavStep::NotReady => {
                let outcome = match rechecks_left {
                    None => self.scheduler.park(intent, now),
                    Some(left) => self.scheduler.repark(
                        DueRecheck {
                            kind,
                            intent,
                            rechecks_left: left,
                        },
                        now,
                    ),
                };
                match outcome {
                    ParkOutcome::Parked(_) => self.stats.deferred += 1,
                    ParkOutcome::Dropped => self.stats.deferred_dropped += 1,
                }
            }
        }
    }

    fn finish_navigation(&mut self, cursor: ViewportCursor<R::Id>, end: PageWaitEnd) {
        if end == PageWaitEnd::TimedOut {
            self.stats.ack_timeouts += 1;
        }
        self.stats.navigations += 1;
        self.in_flight = None;
        debug!(
            page = cursor.page,
            row = cursor.row,
            selected = ?cursor.selected,
            "navigation complete"
        );
        self.cursor = Some(cursor);
    }

    /// Re-derive an in-flight navigation's cursor from the latest snapshot.
    ///
    /// Same page: the wait continues with the new row. Different page, or no
    /// page size: the wait is abandoned and the target navigated (or parked)
    /// afresh. Gone: the wait is abandoned.
    fn follow_in_flight<S: ViewSurface<R::Id>>(&mut self, now: Instant, surface: &mut S) {
        let Some(target) = self.driver.in_flight().map(|c| c.selected.clone()) else {
            return;
        };
        let index = self.snapshot.position_of(&target);
        if let (Some(index), Some(page_size)) = (index, surface.page_size()) {
            let cursor = ViewportCursor::derive(index, page_size, target.clone());
            if self.driver.retarget(cursor) {
                return;
            }
        }

        self.driver.abort();
        let Some(InFlight { kind, intent }) = self.in_flight.take() else {
            return;
        };
        match index {
            Some(index) => {
                debug!(
                    kind = kind.as_str(),
                    index, "navigation target moved pages; re-navigating"
                );
                self.try_navigate(kind, index, target, intent, None, now, surface);
            }
            None => {
                debug!(
                    kind = kind.as_str(),
                    selected = ?target,
                    "navigation target left the snapshot"
                );
            }
        }
    }

    fn abort_in_flight(&mut self, kind: MutationKind) -> bool {
        if self.in_flight.as_ref().map(|f| f.kind) != Some(kind) {
            return false;
        }
        self.in_flight = None;
        self.driver.abort().is_some()
    }
}
