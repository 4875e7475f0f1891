#![forbid(unsafe_code)]

//! Transient "recently changed" highlight.
//!
//! Each mutation kind has at most one active highlight. Starting a new one
//! for the same kind replaces the previous entry instead of stacking.
//! Highlights are started on resolution, independently of whether the
//! navigation that follows succeeds.
//!
//! UI code listens for [`HighlightChange`]s: one per transition, carrying
//! the kind and `Some(id)` when emphasis starts or moves, `None` when it
//! ends. Restarting the highlight on the id that is already emphasised only
//! extends the window and is not a transition.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use ffocus_core::MutationKind;
use tracing::debug;
use web_time::{Duration, Instant};

/// One active highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightEntry<I> {
    /// Highlighted record.
    pub id: I,
    /// When the highlight ends.
    pub expires_at: Instant,
}

/// A highlight transition for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightChange<I> {
    /// Kind whose highlight changed.
    pub kind: MutationKind,
    /// The newly highlighted record, or `None` when the highlight ended.
    pub id: Option<I>,
}

type Listener<I> = Rc<dyn Fn(&HighlightChange<I>)>;

struct Listeners<I> {
    next_token: u64,
    entries: Vec<(u64, Listener<I>)>,
}

/// Keeps a highlight listener registered; dropping it unregisters.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct HighlightSubscription {
    unregister: Option<Box<dyn FnOnce()>>,
}

impl Drop for HighlightSubscription {
    fn drop(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl Debug for HighlightSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightSubscription").finish_non_exhaustive()
    }
}

/// Per-kind highlight timer.
pub struct HighlightTimer<I> {
    entries: [Option<HighlightEntry<I>>; 3],
    listeners: Rc<RefCell<Listeners<I>>>,
    duration: Duration,
}

impl<I: Debug> Debug for HighlightTimer<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightTimer")
            .field("entries", &self.entries)
            .field("listeners", &self.listeners.borrow().entries.len())
            .field("duration", &self.duration)
            .finish()
    }
}

impl<I: Clone + PartialEq + Debug + 'static> HighlightTimer<I> {
    /// Create a timer whose highlights last `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            entries: [None, None, None],
            listeners: Rc::new(RefCell::new(Listeners {
                next_token: 0,
                entries: Vec::new(),
            })),
            duration,
        }
    }

    /// Highlight `id` for `kind`, replacing any active highlight of that kind.
    pub fn start(&mut self, kind: MutationKind, id: I, now: Instant) {
        let expires_at = now + self.duration;
        let slot = &mut self.entries[kind.index()];
        let same = slot.as_ref().is_some_and(|prev| prev.id == id);
        if let Some(prev) = slot.as_ref().filter(|_| !same) {
            debug!(kind = kind.as_str(), previous = ?prev.id, "highlight superseded");
        }
        *slot = Some(HighlightEntry {
            id: id.clone(),
            expires_at,
        });
        if !same {
            self.emit(kind, Some(id));
        }
    }

    /// End the highlight for `kind` early.
    pub fn cancel(&mut self, kind: MutationKind) {
        if self.entries[kind.index()].take().is_some() {
            self.emit(kind, None);
        }
    }

    /// Expire highlights whose window has elapsed. Returns the kinds that
    /// ended.
    pub fn on_tick(&mut self, now: Instant) -> Vec<MutationKind> {
        let mut ended = Vec::new();
        for kind in MutationKind::ALL {
            let due = self.entries[kind.index()]
                .as_ref()
                .is_some_and(|e| now >= e.expires_at);
            if due {
                self.entries[kind.index()] = None;
                self.emit(kind, None);
                ended.push(kind);
            }
        }
        ended
    }

    /// The active highlight for `kind`.
    pub fn active(&self, kind: MutationKind) -> Option<&HighlightEntry<I>> {
        self.entries[kind.index()].as_ref()
    }

    /// Call `listener` on every future transition, until the returned
    /// subscription is dropped.
    pub fn subscribe(
        &self,
        listener: impl Fn(&HighlightChange<I>) + 'static,
    ) -> HighlightSubscription {
        let token = {
            let mut listeners = self.listeners.borrow_mut();
            let token = listeners.next_token;
            listeners.next_token += 1;
            listeners.entries.push((token, Rc::new(listener)));
            token
        };
        let registry: Weak<RefCell<Listeners<I>>> = Rc::downgrade(&self.listeners);
        HighlightSubscription {
            unregister: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.borrow_mut().entries.retain(|(t, _)| *t != token);
                }
            })),
        }
    }

    /// Earliest expiry across all kinds.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .iter()
            .flatten()
            .map(|e| e.expires_at)
            .min()
    }

    fn emit(&self, kind: MutationKind, id: Option<I>) {
        // Snapshot the listeners so one may subscribe or unsubscribe while
        // being called.
        let listeners: Vec<Listener<I>> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        debug!(
            kind = kind.as_str(),
            id = ?id,
            listeners = listeners.len(),
            "highlight changed"
        );
        let change = HighlightChange { kind, id };
        for listener in &listeners {
            listener(&change);
        }
    }
}
