#![forbid(unsafe_code)]

//! Navigation driver.
//!
//! Sequences a page change, a selection, and a scroll-into-view against a
//! [`ViewSurface`]:
//!
//! 1. Read the surface's current page. If it already shows the target page,
//!    go straight to step 3.
//! 2. Otherwise issue `set_page` and wait for the page-changed
//!    acknowledgment, bounded by a non-renewing timeout. A missed
//!    acknowledgment must not block navigation forever, so expiry proceeds
//!    as if the acknowledgment had arrived.
//! 3. Issue `select_row(id)` then `scroll_to(row)`.
//!
//! The driver's only state is the in-flight page wait, which keeps two
//! navigations from interleaving their waits. A navigation requested while
//! one is in flight is refused with [`NavStep::Busy`].

use std::fmt::Debug;

use ffocus_core::ViewportCursor;
use tracing::{debug, info_span, warn};
use web_time::{Duration, Instant};

use crate::surface::ViewSurface;

/// Result of asking the driver to navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavStep<I> {
    /// Selection and scroll were issued immediately.
    Completed(ViewportCursor<I>),
    /// `set_page` was issued; selection follows the acknowledgment.
    AwaitingPage(ViewportCursor<I>),
    /// Another navigation is waiting on a page change.
    Busy,
    /// The surface has no page size yet.
    NotReady,
}

/// How a pending page wait finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWaitEnd {
    /// The surface acknowledged the page change.
    Acknowledged,
    /// The acknowledgment never came; navigation proceeded anyway.
    TimedOut,
}

#[derive(Debug)]
enum Phase<I> {
    Idle,
    AwaitingPage {
        cursor: ViewportCursor<I>,
        deadline: Instant,
    },
}

/// Drives a [`ViewSurface`] to a target row.
#[derive(Debug)]
pub struct NavigationDriver<I> {
    phase: Phase<I>,
    ack_timeout: Duration,
}

impl<I: Clone + Debug> NavigationDriver<I> {
    /// Create an idle driver with the given acknowledgment timeout.
    pub fn new(ack_timeout: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            ack_timeout,
        }
    }

    /// Whether a page wait is in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::AwaitingPage { .. })
    }

    /// Deadline of the in-flight page wait, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::AwaitingPage { deadline, .. } => Some(*deadline),
            Phase::Idle => None,
        }
    }

    /// The cursor being navigated to, if a page wait is in flight.
    pub fn in_flight(&self) -> Option<&ViewportCursor<I>> {
        match &self.phase {
            Phase::AwaitingPage { cursor, .. } => Some(cursor),
            Phase::Idle => None,
        }
    }

    /// Navigate to the record `id` sitting at absolute `index`.
    pub fn navigate<S: ViewSurface<I>>(
        &mut self,
        index: usize,
        id: I,
        surface: &mut S,
        now: Instant,
    ) -> NavStep<I> {
        if self.is_busy() {
            return NavStep::Busy;
        }
        let Some(page_size) = surface.page_size() else {
            return NavStep::NotReady;
        };
        let cursor = ViewportCursor::derive(index, page_size, id);
        let _span = info_span!(
            "ffocus.navigate",
            index,
            page = cursor.page,
            row = cursor.row,
            page_size = page_size.get()
        )
        .entered();

        let current = surface.current_page();
        if current == cursor.page {
            debug!(page = current, "target already on current page");
            reveal(surface, &cursor);
            return NavStep::Completed(cursor);
        }

        debug!(from = current, to = cursor.page, "changing page");
        surface.set_page(cursor.page);
        self.phase = Phase::AwaitingPage {
            cursor: cursor.clone(),
            deadline: now + self.ack_timeout,
        };
        NavStep::AwaitingPage(cursor)
    }

    /// Feed a page-changed acknowledgment from the surface.
    ///
    /// Acknowledgments for other pages are ignored; the wait continues until
    /// the matching page or the timeout.
    pub fn on_page_changed<S: ViewSurface<I>>(
        &mut self,
        page: usize,
        surface: &mut S,
    ) -> Option<(ViewportCursor<I>, PageWaitEnd)> {
        match &self.phase {
            Phase::AwaitingPage { cursor, .. } if cursor.page == page => {}
            Phase::AwaitingPage { cursor, .. } => {
                debug!(expected = cursor.page, got = page, "ignoring page ack");
                return None;
            }
            Phase::Idle => return None,
        }
        let cursor = self.finish()?;
        reveal(surface, &cursor);
        Some((cursor, PageWaitEnd::Acknowledged))
    }

    /// Advance time; completes a page wait whose timeout has elapsed.
    pub fn on_tick<S: ViewSurface<I>>(
        &mut self,
        now: Instant,
        surface: &mut S,
    ) -> Option<(ViewportCursor<I>, PageWaitEnd)> {
        match &self.phase {
            Phase::AwaitingPage { deadline, .. } if now >= *deadline => {}
            _ => return None,
        }
        let cursor = self.finish()?;
        warn!(
            page = cursor.page,
            timeout_ms = u64::try_from(self.ack_timeout.as_millis()).unwrap_or(u64::MAX),
            "page change not acknowledged; selecting anyway"
        );
        reveal(surface, &cursor);
        Some((cursor, PageWaitEnd::TimedOut))
    }

    /// Replace the in-flight cursor with `cursor` if it targets the page
    /// already being waited on. The acknowledgment deadline is kept.
    ///
    /// Returns `false` (and changes nothing) when idle or when `cursor`
    /// lies on another page.
    pub fn retarget(&mut self, cursor: ViewportCursor<I>) -> bool {
        match &mut self.phase {
            Phase::AwaitingPage { cursor: current, .. } if current.page == cursor.page => {
                if current.row != cursor.row {
                    debug!(from = current.row, to = cursor.row, "in-flight row moved");
                }
                *current = cursor;
                true
            }
            _ => false,
        }
    }

    /// Abandon any in-flight page wait without selecting.
    pub fn abort(&mut self) -> Option<ViewportCursor<I>> {
        self.finish()
    }

    fn finish(&mut self) -> Option<ViewportCursor<I>> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingPage { cursor, .. } => Some(cursor),
            Phase::Idle => None,
        }
    }
}

/// Select then scroll, as two independent commands.
fn reveal<I, S: ViewSurface<I>>(surface: &mut S, cursor: &ViewportCursor<I>) {
    surface.select_row(&cursor.selected);
    surface.scroll_to(cursor.row);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[derive(Debug, PartialEq)]
    enum Call {
        SetPage(usize),
        Select(u32),
        Scroll(usize),
    }

    struct FakeSurface {
        page: usize,
        size: Option<NonZeroUsize>,
        calls: Vec<Call>,
    }

    impl FakeSurface {
        fn new(page: usize, size: usize) -> Self {
            Self {
                page,
                size: NonZeroUsize::new(size),
                calls: Vec::new(),
            }
        }
    }

    impl ViewSurface<u32> for FakeSurface {
        fn current_page(&self) -> usize {
            self.page
        }
        fn page_size(&self) -> Option<NonZeroUsize> {
            self.size
        }
        fn set_page(&mut self, page: usize) {
            self.calls.push(Call::SetPage(page));
        }
        fn select_row(&mut self, id: &u32) {
            self.calls.push(Call::Select(*id));
        }
        fn scroll_to(&mut self, row: usize) {
            self.calls.push(Call::Scroll(row));
        }
    }

    fn driver() -> NavigationDriver<u32> {
        NavigationDriver::new(Duration::from_millis(300))
    }

    #[test]
    fn same_page_selects_immediately() {
        let mut surface = FakeSurface::new(1, 10);
        let mut nav = driver();
        let step = nav.navigate(13, 7, &mut surface, Instant::now());
        assert!(matches!(step, NavStep::Completed(ref c) if c.page == 1 && c.row == 3));
        assert_eq!(surface.calls, vec![Call::Select(7), Call::Scroll(3)]);
        assert!(!nav.is_busy());
    }

    #[test]
    fn page_change_waits_for_ack() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        let step = nav.navigate(11, 5, &mut surface, Instant::now());
        assert!(matches!(step, NavStep::AwaitingPage(_)));
        assert_eq!(surface.calls, vec![Call::SetPage(1)]);
        assert!(nav.is_busy());

        let done = nav.on_page_changed(1, &mut surface);
        assert_eq!(done.map(|(_, end)| end), Some(PageWaitEnd::Acknowledged));
        assert_eq!(
            surface.calls,
            vec![Call::SetPage(1), Call::Select(5), Call::Scroll(1)]
        );
        assert!(!nav.is_busy());
    }

    #[test]
    fn mismatched_ack_is_ignored() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        nav.navigate(25, 5, &mut surface, Instant::now());
        assert!(nav.on_page_changed(1, &mut surface).is_none());
        assert!(nav.is_busy());
        assert_eq!(surface.calls, vec![Call::SetPage(2)]);
    }

    #[test]
    fn timeout_proceeds_anyway() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        let start = Instant::now();
        nav.navigate(11, 5, &mut surface, start);

        assert!(nav.on_tick(start + Duration::from_millis(299), &mut surface).is_none());
        let done = nav.on_tick(start + Duration::from_millis(300), &mut surface);
        assert_eq!(done.map(|(_, end)| end), Some(PageWaitEnd::TimedOut));
        assert_eq!(
            surface.calls,
            vec![Call::SetPage(1), Call::Select(5), Call::Scroll(1)]
        );
    }

    #[test]
    fn second_navigation_is_refused_while_waiting() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        let now = Instant::now();
        nav.navigate(11, 5, &mut surface, now);
        assert_eq!(nav.navigate(2, 9, &mut surface, now), NavStep::Busy);
        assert_eq!(surface.calls, vec![Call::SetPage(1)]);
    }

    #[test]
    fn no_page_size_is_not_ready() {
        let mut surface = FakeSurface::new(0, 0);
        let mut nav = driver();
        assert_eq!(
            nav.navigate(3, 1, &mut surface, Instant::now()),
            NavStep::NotReady
        );
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn retarget_keeps_wait_on_same_page() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        let start = Instant::now();
        nav.navigate(13, 5, &mut surface, start);

        let moved = ViewportCursor::derive(11, NonZeroUsize::new(10).unwrap(), 5);
        assert!(nav.retarget(moved));
        assert_eq!(nav.next_deadline(), Some(start + Duration::from_millis(300)));
        nav.on_page_changed(1, &mut surface);
        assert_eq!(
            surface.calls,
            vec![Call::SetPage(1), Call::Select(5), Call::Scroll(1)]
        );
    }

    #[test]
    fn retarget_refuses_other_page_or_idle() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        let size = NonZeroUsize::new(10).unwrap();
        assert!(!nav.retarget(ViewportCursor::derive(3, size, 5)));

        nav.navigate(13, 5, &mut surface, Instant::now());
        assert!(!nav.retarget(ViewportCursor::derive(3, size, 5)));
        assert_eq!(nav.in_flight().map(|c| (c.page, c.row)), Some((1, 3)));
    }

    #[test]
    fn abort_clears_wait_without_selecting() {
        let mut surface = FakeSurface::new(0, 10);
        let mut nav = driver();
        nav.navigate(11, 5, &mut surface, Instant::now());
        assert!(nav.abort().is_some());
        assert!(nav.on_page_changed(1, &mut surface).is_none());
        assert_eq!(surface.calls, vec![Call::SetPage(1)]);
    }
}
