#![forbid(unsafe_code)]

//! Deterministic scenario driver.
//!
//! [`Scenario`] owns an [`Engine`], a [`RecordingSurface`], and a virtual
//! clock. It plays the host's role: delivering queued page
//! acknowledgments and firing [`Msg::Tick`] at the instants the engine asks
//! for. Time only moves when a test moves it, so timeout paths are exact.

use std::fmt::Debug;

use ffocus_core::{Intent, MutationKind, Record, Snapshot};
use ffocus_runtime::{Engine, Msg, MutationOutcome, ReconcileConfig};
use tracing::{debug, info_span};
use web_time::{Duration, Instant};

use crate::surface::RecordingSurface;

/// Upper bound on ticks processed by [`Scenario::settle`].
const MAX_SETTLE_STEPS: usize = 256;

/// Engine + recording surface + virtual clock.
pub struct Scenario<R: Record, K> {
    engine: Engine<R, K>,
    surface: RecordingSurface<R::Id>,
    start: Instant,
    now: Instant,
    wake_at: Option<Instant>,
    steps: u64,
}

impl<R, K> Scenario<R, K>
where
    R: Record + Debug,
    R::Id: 'static,
    K: PartialEq + Debug,
{
    /// Build a scenario around a fresh engine.
    pub fn new(
        config: ReconcileConfig,
        key_of: impl Fn(&R) -> K + 'static,
        surface: RecordingSurface<R::Id>,
    ) -> Self {
        let now = Instant::now();
        Self {
            engine: Engine::new(config, key_of),
            surface,
            start: now,
            now,
            wake_at: None,
            steps: 0,
        }
    }

    /// Seed the snapshot current before any mutation.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Snapshot<R>) -> Self {
        self.engine = self.engine.with_snapshot(snapshot);
        self
    }

    /// Deliver one message at the current virtual time.
    pub fn send(&mut self, msg: Msg<R, K>) {
        self.steps += 1;
        let _span = info_span!(
            "ffocus.scenario.step",
            step = self.steps,
            elapsed_ms = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
        )
        .entered();
        self.wake_at = self.engine.update(msg, self.now, &mut self.surface);
    }

    /// Record a reconciliation intent.
    pub fn request(&mut self, intent: Intent<R::Id, K>) {
        self.send(Msg::Request(intent));
    }

    /// Capture the delete neighbor from the current snapshot and record the
    /// delete intent, as a caller would right before dispatching.
    pub fn request_delete(&mut self, id: &R::Id) {
        let intent = self.engine.prepare_delete(id);
        self.request(intent);
    }

    /// Report a settled mutation.
    pub fn settle_mutation(&mut self, kind: MutationKind, outcome: MutationOutcome<R::Id>) {
        self.send(Msg::MutationSettled { kind, outcome });
    }

    /// Deliver a refetched snapshot.
    pub fn snapshot(&mut self, snapshot: Snapshot<R>) {
        self.send(Msg::SnapshotReplaced(snapshot));
    }

    /// Deliver every queued page acknowledgment. Returns how many.
    pub fn deliver_acks(&mut self) -> usize {
        let acks = self.surface.take_acks();
        let n = acks.len();
        for page in acks {
            self.send(Msg::PageChanged(page));
        }
        n
    }

    /// Advance the virtual clock by `by`, firing a tick if the engine's
    /// wake-up time has been reached.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        if self.wake_at.is_some_and(|at| self.now >= at) {
            self.send(Msg::Tick);
        }
    }

    /// Jump straight to the engine's next wake-up, if any, and tick.
    pub fn advance_to_wake(&mut self) -> bool {
        match self.wake_at {
            Some(at) => {
                if at > self.now {
                    self.now = at;
                }
                self.send(Msg::Tick);
                true
            }
            None => false,
        }
    }

    /// Deliver acknowledgments and fire ticks until nothing is armed.
    ///
    /// Returns the number of ticks fired. Highlights are timers too, so a
    /// settled engine has no active highlight either.
    pub fn settle(&mut self) -> usize {
        let mut ticks = 0;
        for _ in 0..MAX_SETTLE_STEPS {
            self.deliver_acks();
            if !self.advance_to_wake() {
                break;
            }
            ticks += 1;
        }
        debug!(ticks, "scenario settled");
        ticks
    }

    /// The engine under test.
    pub fn engine(&self) -> &Engine<R, K> {
        &self.engine
    }

    /// The recording surface.
    pub fn surface(&self) -> &RecordingSurface<R::Id> {
        &self.surface
    }

    /// Mutable access to the recording surface.
    pub fn surface_mut(&mut self) -> &mut RecordingSurface<R::Id> {
        &mut self.surface
    }

    /// Current virtual time.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Virtual time since the scenario started.
    pub fn elapsed(&self) -> Duration {
        self.now.duration_since(self.start)
    }

    /// The engine's requested wake-up time.
    pub fn wake_at(&self) -> Option<Instant> {
        self.wake_at
    }
}
