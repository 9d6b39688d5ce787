//! Integration tests: point synchronization through the realtime feed.

mod common;

use common::*;
use gm_core::{FeedError, GeoPoint, MapConfig, MapPosition, OwnerId, Rgb};
use gm_session::{ClickEvent, InteractionMode, KeyedDiff, Session};
use pretty_assertions::assert_eq;

const POINTS: &str = "list1";

fn owner() -> OwnerId {
    OwnerId::intern("u1")
}

// ─── Snapshots ──────────────────────────────────────────────────────────

#[test]
fn connect_renders_the_owner_scope_only() {
    let h = Harness::new();
    h.feed.seed(POINTS, point_json(45.0, 25.0, "u1"));
    h.feed.seed(POINTS, point_json(46.0, 26.0, "u2"));
    h.feed.seed(POINTS, point_json(47.0, 27.0, "u1"));

    let mut session = h.session();
    session.connect(owner());
    assert_eq!(pump(&mut session), 1);

    let lats: Vec<f64> = session.store().points().iter().map(|p| p.latitude).collect();
    assert_eq!(lats, vec![45.0, 47.0]);
    assert_eq!(*h.map.points.borrow(), session.store().points().to_vec());
}

#[test]
fn store_matches_every_snapshot_exactly() {
    let h = Harness::new();
    let mut session = h.session();
    session.connect(owner());

    let snapshots = [
        vec![point_json(1.0, 1.0, "u1"), point_json(2.0, 2.0, "u1")],
        vec![point_json(2.0, 2.0, "u1"), point_json(3.0, 3.0, "u1")],
        vec![],
        vec![point_json(4.0, 4.0, "u1")],
    ];
    for (i, snapshot) in snapshots.iter().enumerate() {
        let records = snapshot
            .iter()
            .enumerate()
            .map(|(n, v)| gm_core::FeedRecord::new(format!("s{i}-{n}"), v.clone()))
            .collect();
        h.feed.emit_raw(POINTS, Ok(records));
        pump(&mut session);

        let lats: Vec<f64> = session.store().points().iter().map(|p| p.latitude).collect();
        let expected: Vec<f64> = snapshot.iter().map(|v| v["lat"].as_f64().unwrap()).collect();
        assert_eq!(lats, expected, "snapshot {i}");
        assert_eq!(h.map.point_count(), expected.len(), "rendered after snapshot {i}");
    }
}

#[test]
fn keyed_diff_reaches_the_same_content() {
    let h = Harness::new();
    let mut session =
        Session::with_strategy(MapConfig::default(), h.collaborators(), KeyedDiff).unwrap();
    session.connect(owner());
    pump(&mut session);

    h.feed.seed(POINTS, point_json(1.0, 1.0, "u1"));
    h.feed.seed(POINTS, point_json(2.0, 2.0, "u1"));
    h.feed.emit_raw(POINTS, Ok(h.feed.records(POINTS)));
    pump(&mut session);
    assert_eq!(h.map.point_count(), 2);

    let mut records = h.feed.records(POINTS);
    records.remove(0);
    h.feed.emit_raw(POINTS, Ok(records));
    pump(&mut session);

    assert_eq!(session.store().len(), 1);
    assert_eq!(*h.map.points.borrow(), session.store().points().to_vec());
    assert_eq!(h.map.points.borrow()[0].latitude, 2.0);
}

#[test]
fn malformed_records_are_skipped() {
    let h = Harness::new();
    h.feed.seed(POINTS, point_json(1.0, 1.0, "u1"));
    h.feed.seed(POINTS, serde_json::json!({"lat": "north", "user": "u1"}));

    let mut session = h.session();
    session.connect(owner());
    pump(&mut session);
    assert_eq!(session.store().len(), 1);
}

// ─── Writes ─────────────────────────────────────────────────────────────

#[test]
fn added_point_renders_only_when_echoed() {
    let h = Harness::new();
    let mut session = h.session();
    session.connect(owner());
    pump(&mut session);

    session.set_mode(InteractionMode::AddPoint);
    session.set_color("#FF8800");
    session.handle_click(ClickEvent::at(45.5, 25.5));
    assert_eq!(h.map.point_count(), 0);

    quiesce(&mut session);
    assert_eq!(
        session.store().points(),
        &[GeoPoint::new(
            MapPosition::new(45.5, 25.5),
            Rgb::new(255, 136, 0),
            owner()
        )]
    );
    assert_eq!(h.map.point_count(), 1);
}

#[test]
fn add_point_at_center_uses_camera() {
    let h = Harness::new();
    h.map.center.set(MapPosition::new(44.4268, 26.1025));
    let mut session = h.session();
    session.connect(owner());
    session.add_point_at_center();
    quiesce(&mut session);

    let points = session.store().points();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].position(), MapPosition::new(44.4268, 26.1025));
    assert_eq!(points[0].color, Rgb::new(255, 165, 0));
}

#[test]
fn clear_points_removes_only_own_records() {
    let h = Harness::new();
    for i in 0..3 {
        h.feed.seed(POINTS, point_json(f64::from(i), 0.0, "u1"));
    }
    h.feed.seed(POINTS, point_json(9.0, 9.0, "u2"));

    let mut session = h.session();
    session.connect(owner());
    pump(&mut session);
    assert_eq!(session.store().len(), 3);

    session.clear_points();
    quiesce(&mut session);

    assert!(session.store().is_empty());
    assert_eq!(h.map.point_count(), 0);
    assert_eq!(h.feed.removes.get(), 3);
    let left = h.feed.records(POINTS);
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].value["user"], "u2");
}

#[test]
fn add_point_without_owner_writes_nothing() {
    let h = Harness::new();
    let mut session = h.session();
    session.set_mode(InteractionMode::AddPoint);
    session.handle_click(ClickEvent::at(1.0, 1.0));
    drive(&mut session);
    assert_eq!(h.feed.pushes.get(), 0);
}

// ─── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn connect_twice_keeps_one_subscription() {
    let h = Harness::new();
    let mut session = h.session();
    session.connect(owner());
    session.connect(OwnerId::intern("u2"));
    assert_eq!(h.feed.subscriber_count(), 1);
    assert_eq!(session.controller().owner(), Some(owner()));
}

#[test]
fn transport_error_keeps_last_snapshot() {
    let h = Harness::new();
    h.feed.seed(POINTS, point_json(1.0, 1.0, "u1"));
    let mut session = h.session();
    session.connect(owner());
    pump(&mut session);

    h.feed
        .emit_raw(POINTS, Err(FeedError::Transport("connection reset".into())));
    assert_eq!(pump(&mut session), 0);

    assert!(!session.is_connected());
    assert_eq!(session.store().len(), 1);
    assert_eq!(h.map.point_count(), 1);

    // Reconnecting is explicit.
    session.connect(owner());
    assert!(session.is_connected());
}

#[test]
fn disconnect_is_idempotent() {
    let h = Harness::new();
    let mut session = h.session();
    session.disconnect();
    session.connect(owner());
    session.disconnect();
    session.disconnect();
    assert!(!session.is_connected());
    assert_eq!(pump(&mut session), 0);
}
