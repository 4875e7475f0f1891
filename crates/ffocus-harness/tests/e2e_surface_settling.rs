#![forbid(unsafe_code)]

//! Surface readiness: missing acknowledgments, views that are not laid out
//! yet, and two kinds resolving in the same snapshot.
//!
//! Run:
//!   cargo test -p ffocus-harness --test e2e_surface_settling

use ffocus_core::{Intent, MutationKind};
use ffocus_harness::fixtures::{countries, country_snapshot};
use ffocus_harness::{AckMode, Country, RecordingSurface, Scenario};
use ffocus_runtime::{ReconcileConfig, SurfaceCommand};
use web_time::Duration;

#[test]
fn missing_ack_times_out_and_selects_anyway() {
    let config = ReconcileConfig::default().page_ack_timeout(Duration::from_millis(250));
    let mut sc = Scenario::new(
        config,
        Country::code_of,
        RecordingSurface::new(10).ack_mode(AckMode::Drop),
    );
    sc.request(Intent::update(18));
    sc.snapshot(country_snapshot(countries(20), 1));
    assert_eq!(sc.surface().commands(), &[SurfaceCommand::SetPage(1)]);
    assert!(sc.engine().is_navigating());

    sc.advance(Duration::from_millis(249));
    assert_eq!(sc.surface().commands().len(), 1);
    sc.advance(Duration::from_millis(1));
    assert_eq!(
        sc.surface().commands(),
        &[
            SurfaceCommand::SetPage(1),
            SurfaceCommand::SelectRow(18),
            SurfaceCommand::ScrollTo(7),
        ]
    );
    assert_eq!(sc.engine().stats().ack_timeouts, 1);
    assert!(!sc.engine().is_navigating());
}

#[test]
fn unlaid_view_defers_until_page_size_known() {
    let config = ReconcileConfig::default().settle(3, Duration::from_millis(50));
    let mut sc = Scenario::new(config, Country::code_of, RecordingSurface::new(0));
    sc.request(Intent::update(4));
    sc.snapshot(country_snapshot(countries(8), 1));
    assert!(sc.surface().commands().is_empty());
    assert_eq!(sc.engine().stats().deferred, 1);

    sc.surface_mut().set_page_size(10);
    sc.advance(Duration::from_millis(50));
    assert_eq!(
        sc.surface().commands(),
        &[SurfaceCommand::SelectRow(4), SurfaceCommand::ScrollTo(3)]
    );
}

#[test]
fn unlaid_view_eventually_gives_up() {
    let config = ReconcileConfig::default().settle(2, Duration::from_millis(50));
    let mut sc = Scenario::new(config, Country::code_of, RecordingSurface::new(0));
    sc.request(Intent::update(4));
    sc.snapshot(country_snapshot(countries(8), 1));
    sc.settle();
    assert!(sc.surface().commands().is_empty());
    assert_eq!(sc.engine().stats().deferred_dropped, 1);
    assert_eq!(sc.wake_at(), None);
}

#[test]
fn parked_target_is_re_resolved_against_latest_snapshot() {
    let config = ReconcileConfig::default().settle(3, Duration::from_millis(50));
    let mut sc = Scenario::new(config, Country::code_of, RecordingSurface::new(0));
    sc.request(Intent::update(4));
    sc.snapshot(country_snapshot(countries(8), 1));

    // Before the re-check, the row moved to the end.
    let mut rows = countries(8);
    rows[3].code = "C900".into();
    sc.snapshot(country_snapshot(rows, 2));
    sc.surface_mut().set_page_size(5);
    sc.advance(Duration::from_millis(50));
    sc.deliver_acks();
    assert_eq!(
        sc.surface().commands(),
        &[
            SurfaceCommand::SetPage(1),
            SurfaceCommand::SelectRow(4),
            SurfaceCommand::ScrollTo(2),
        ]
    );
}

#[test]
fn create_and_delete_in_one_snapshot_do_not_interleave() {
    let mut sc = Scenario::new(
        ReconcileConfig::default(),
        Country::code_of,
        RecordingSurface::new(10),
    )
    .with_snapshot(country_snapshot(countries(15), 0));

    sc.request(Intent::create("C100".to_string()));
    sc.request_delete(&2);

    let mut rows: Vec<Country> = countries(15).into_iter().filter(|c| c.id != 2).collect();
    rows.push(Country::new(100, "C100", "Hundred"));
    sc.snapshot(country_snapshot(rows, 1));

    // Create resolves first ("C100" sorts after "C015": index 14, page 1).
    assert_eq!(sc.surface().commands(), &[SurfaceCommand::SetPage(1)]);
    sc.settle();
    assert_eq!(
        sc.surface().commands(),
        &[
            SurfaceCommand::SetPage(1),
            SurfaceCommand::SelectRow(100),
            SurfaceCommand::ScrollTo(4),
            SurfaceCommand::SetPage(0),
            SurfaceCommand::SelectRow(1),
            SurfaceCommand::ScrollTo(0),
        ]
    );
    assert_eq!(sc.engine().stats().navigations, 2);
    assert_eq!(sc.engine().highlight(MutationKind::Create), None);
}

#[test]
fn target_moving_pages_mid_wait_is_navigated_again() {
    let mut sc = Scenario::new(
        ReconcileConfig::default(),
        Country::code_of,
        RecordingSurface::new(10),
    );
    sc.request(Intent::update(14));
    sc.snapshot(country_snapshot(countries(20), 1));
    assert_eq!(sc.surface().commands(), &[SurfaceCommand::SetPage(1)]);

    // Before the page ack, a refetch re-sorts id 14 to the top.
    let mut rows = countries(20);
    rows[13].code = "A014".into();
    sc.snapshot(country_snapshot(rows, 2));
    assert_eq!(sc.engine().snapshot().position_of(&14), Some(0));

    sc.deliver_acks();
    assert_eq!(
        sc.surface().commands(),
        &[
            SurfaceCommand::SetPage(1),
            SurfaceCommand::SetPage(0),
            SurfaceCommand::SelectRow(14),
            SurfaceCommand::ScrollTo(0),
        ]
    );
    let cursor = sc.engine().cursor().expect("navigated");
    assert_eq!((cursor.page, cursor.row, cursor.selected), (0, 0, 14));
    assert_eq!(sc.engine().stats().navigations, 1);
}

#[test]
fn target_moving_within_page_mid_wait_scrolls_to_new_row() {
    let mut sc = Scenario::new(
        ReconcileConfig::default(),
        Country::code_of,
        RecordingSurface::new(10),
    );
    sc.request(Intent::update(14));
    sc.snapshot(country_snapshot(countries(20), 1));

    // Two earlier rows vanish: id 14 moves from index 13 to 11, still page 1.
    let rows: Vec<Country> = countries(20)
        .into_iter()
        .filter(|c| c.id != 11 && c.id != 12)
        .collect();
    sc.snapshot(country_snapshot(rows, 2));
    sc.deliver_acks();
    assert_eq!(
        sc.surface().commands(),
        &[
            SurfaceCommand::SetPage(1),
            SurfaceCommand::SelectRow(14),
            SurfaceCommand::ScrollTo(1),
        ]
    );
    let cursor = sc.engine().cursor().expect("navigated");
    assert_eq!((cursor.page, cursor.row), (1, 1));
}

#[test]
fn target_moving_mid_wait_with_missed_ack_times_out_on_new_page() {
    let mut sc = Scenario::new(
        ReconcileConfig::default(),
        Country::code_of,
        RecordingSurface::new(10).ack_mode(AckMode::Drop),
    );
    sc.request(Intent::update(3));
    let mut rows = countries(20);
    rows[2].code = "C950".into();
    sc.snapshot(country_snapshot(rows, 1));
    assert_eq!(sc.surface().commands(), &[SurfaceCommand::SetPage(1)]);

    sc.snapshot(country_snapshot(countries(20), 2));
    sc.advance(Duration::from_millis(300));
    assert_eq!(
        sc.surface().commands(),
        &[
            SurfaceCommand::SetPage(1),
            SurfaceCommand::SetPage(0),
            SurfaceCommand::SelectRow(3),
            SurfaceCommand::ScrollTo(2),
        ]
    );
}
