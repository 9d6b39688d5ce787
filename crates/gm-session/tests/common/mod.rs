//! In-memory collaborators for driving a `Session` in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::FutureExt;
use futures::channel::{mpsc, oneshot};
use futures::stream::{self, StreamExt};
use gm_core::*;
use gm_session::{
    Collaborators, MapSurface, PanelHost, RealtimeFeed, RouteParams, RouteSolver, Session,
    SnapshotStream,
};
use serde_json::{Map, Value, json};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Map ────────────────────────────────────────────────────────────────

pub struct FakeMap {
    pub points: RefCell<Vec<GeoPoint>>,
    pub waypoints: RefCell<Vec<Waypoint>>,
    pub routes: RefCell<Vec<(Polyline, PathStyle)>>,
    pub hits: RefCell<Vec<HitFeature>>,
    pub hit_tests: Cell<usize>,
    pub center: Cell<MapPosition>,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self {
            points: RefCell::default(),
            waypoints: RefCell::default(),
            routes: RefCell::default(),
            hits: RefCell::default(),
            hit_tests: Cell::new(0),
            center: Cell::new(MapPosition::new(45.8390366, 25.9727299)),
        }
    }
}

impl FakeMap {
    pub fn set_hits(&self, hits: Vec<HitFeature>) {
        *self.hits.borrow_mut() = hits;
    }

    pub fn point_count(&self) -> usize {
        self.points.borrow().len()
    }
}

#[async_trait(?Send)]
impl MapSurface for FakeMap {
    fn add_point(&self, point: &GeoPoint) {
        self.points.borrow_mut().push(point.clone());
    }

    fn remove_point(&self, point: &GeoPoint) {
        let mut points = self.points.borrow_mut();
        if let Some(i) = points.iter().position(|p| p == point) {
            points.remove(i);
        }
    }

    fn clear_points(&self) {
        self.points.borrow_mut().clear();
    }

    fn add_waypoint(&self, waypoint: &Waypoint) {
        self.waypoints.borrow_mut().push(*waypoint);
    }

    fn draw_route(&self, geometry: &Polyline, style: &PathStyle) {
        self.routes.borrow_mut().push((geometry.clone(), *style));
    }

    fn clear_route_graphics(&self) {
        self.waypoints.borrow_mut().clear();
        self.routes.borrow_mut().clear();
    }

    fn camera_center(&self) -> MapPosition {
        self.center.get()
    }

    async fn hit_test(&self, _screen: ScreenPosition) -> Result<Vec<HitFeature>, LookupError> {
        self.hit_tests.set(self.hit_tests.get() + 1);
        Ok(self.hits.borrow().clone())
    }
}

// ─── Panels ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakePanels {
    pub shown: RefCell<HashMap<PanelAnchor, UiPanel>>,
}

impl FakePanels {
    pub fn at(&self, anchor: PanelAnchor) -> Option<UiPanel> {
        self.shown.borrow().get(&anchor).cloned()
    }

    pub fn items_at(&self, anchor: PanelAnchor) -> Vec<String> {
        self.at(anchor)
            .map(|p| p.items().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

impl PanelHost for FakePanels {
    fn add(&self, anchor: PanelAnchor, panel: UiPanel) {
        self.shown.borrow_mut().insert(anchor, panel);
    }

    fn clear(&self, anchor: PanelAnchor) {
        self.shown.borrow_mut().remove(&anchor);
    }

    fn remove_all(&self) {
        self.shown.borrow_mut().clear();
    }
}

// ─── Feed ───────────────────────────────────────────────────────────────

type Emission = Result<Vec<FeedRecord>, FeedError>;

struct Subscriber {
    collection: String,
    filter_key: String,
    filter_value: String,
    tx: mpsc::UnboundedSender<Emission>,
}

/// Realtime store backed by in-memory collections. Every write re-emits the
/// full matching set to every live subscriber of that collection.
#[derive(Default)]
pub struct FakeFeed {
    collections: RefCell<HashMap<String, Vec<FeedRecord>>>,
    subscribers: RefCell<Vec<Subscriber>>,
    next_key: Cell<u64>,
    pub pushes: Cell<usize>,
    pub removes: Cell<usize>,
}

fn in_scope(record: &FeedRecord, key: &str, value: &str) -> bool {
    record.value.get(key).and_then(Value::as_str) == Some(value)
}

impl FakeFeed {
    pub fn seed(&self, collection: &str, value: Value) {
        let key = self.fresh_key();
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .push(FeedRecord::new(key, value));
    }

    pub fn records(&self, collection: &str) -> Vec<FeedRecord> {
        self.collections
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Emit an arbitrary item to every subscriber of `collection`.
    pub fn emit_raw(&self, collection: &str, emission: Emission) {
        for sub in self.subscribers.borrow().iter() {
            if sub.collection == collection {
                let _ = sub.tx.unbounded_send(emission.clone());
            }
        }
    }

    fn fresh_key(&self) -> String {
        let n = self.next_key.get();
        self.next_key.set(n + 1);
        format!("rec-{n}")
    }

    fn matching(&self, collection: &str, key: &str, value: &str) -> Vec<FeedRecord> {
        self.records(collection)
            .into_iter()
            .filter(|r| in_scope(r, key, value))
            .collect()
    }

    fn notify(&self, collection: &str) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|sub| !sub.tx.is_closed());
        for sub in subscribers.iter() {
            if sub.collection == collection {
                let snapshot = self.matching(collection, &sub.filter_key, &sub.filter_value);
                let _ = sub.tx.unbounded_send(Ok(snapshot));
            }
        }
    }
}

#[async_trait(?Send)]
impl RealtimeFeed for FakeFeed {
    fn subscribe(&self, collection: &str, filter_key: &str, filter_value: &str) -> SnapshotStream {
        let (tx, rx) = mpsc::unbounded();
        let _ = tx.unbounded_send(Ok(self.matching(collection, filter_key, filter_value)));
        self.subscribers.borrow_mut().push(Subscriber {
            collection: collection.to_string(),
            filter_key: filter_key.to_string(),
            filter_value: filter_value.to_string(),
            tx,
        });
        rx.boxed_local()
    }

    async fn push(&self, collection: &str, record: Value) -> Result<(), FeedError> {
        self.pushes.set(self.pushes.get() + 1);
        self.seed(collection, record);
        self.notify(collection);
        Ok(())
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<(), FeedError> {
        self.removes.set(self.removes.get() + 1);
        if let Some(records) = self.collections.borrow_mut().get_mut(collection) {
            records.retain(|r| r.key != key);
        }
        self.notify(collection);
        Ok(())
    }

    fn query_once(&self, collection: &str, filter_key: &str, filter_value: &str) -> SnapshotStream {
        let snapshot = self.matching(collection, filter_key, filter_value);
        stream::once(async move { Ok(snapshot) }).boxed_local()
    }
}

// ─── Router ─────────────────────────────────────────────────────────────

type Answer = Result<RouteSolution, RouteError>;

/// Route solver whose answers are released by the test, in any order.
#[derive(Default)]
pub struct FakeRouter {
    pub calls: RefCell<Vec<RouteParams>>,
    pending: RefCell<Vec<Option<oneshot::Sender<Answer>>>>,
    queued: RefCell<VecDeque<Answer>>,
}

impl FakeRouter {
    /// Answer the next solve immediately.
    pub fn queue(&self, answer: Answer) {
        self.queued.borrow_mut().push_back(answer);
    }

    /// Release the answer of the `call`-th solve that was left waiting.
    pub fn respond(&self, call: usize, answer: Answer) {
        let sender = self
            .pending
            .borrow_mut()
            .get_mut(call)
            .and_then(Option::take)
            .expect("no pending solve at that index");
        let _ = sender.send(answer);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().iter().filter(|s| s.is_some()).count()
    }
}

#[async_trait(?Send)]
impl RouteSolver for FakeRouter {
    async fn solve(&self, _service_url: &str, params: &RouteParams) -> Answer {
        self.calls.borrow_mut().push(params.clone());
        if let Some(answer) = self.queued.borrow_mut().pop_front() {
            return answer;
        }
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push(Some(tx));
        rx.await
            .unwrap_or_else(|_| Err(RouteError::Transport("solver dropped".into())))
    }
}

// ─── Harness ────────────────────────────────────────────────────────────

pub struct Harness {
    pub map: Rc<FakeMap>,
    pub feed: Rc<FakeFeed>,
    pub router: Rc<FakeRouter>,
    pub panels: Rc<FakePanels>,
}

impl Harness {
    pub fn new() -> Self {
        init_logger();
        Self {
            map: Rc::new(FakeMap::default()),
            feed: Rc::new(FakeFeed::default()),
            router: Rc::new(FakeRouter::default()),
            panels: Rc::new(FakePanels::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            map: self.map.clone(),
            feed: self.feed.clone(),
            router: self.router.clone(),
            panels: self.panels.clone(),
        }
    }

    pub fn session(&self) -> Session {
        Session::new(MapConfig::default(), self.collaborators()).unwrap()
    }
}

/// Poll every in-flight request once, completing whatever is ready.
pub fn drive<R: gm_session::Reconcile>(session: &mut Session<R>) {
    let _ = session.settle().now_or_never();
}

/// Reconcile every feed emission that is already waiting. Returns how many
/// were applied.
pub fn pump<R: gm_session::Reconcile>(session: &mut Session<R>) -> usize {
    let mut applied = 0;
    while let Some(true) = session.pump_feed().now_or_never() {
        applied += 1;
    }
    applied
}

/// Drive requests and feed emissions until neither makes progress.
pub fn quiesce<R: gm_session::Reconcile>(session: &mut Session<R>) {
    loop {
        drive(session);
        if pump(session) == 0 {
            break;
        }
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────────

pub fn point_json(lat: f64, lng: f64, owner: &str) -> Value {
    json!({"lat": lat, "lng": lng, "color": [255, 165, 0], "user": owner})
}

pub fn route(steps: &[(&str, f64)]) -> RouteResult {
    RouteResult {
        geometry: Polyline {
            paths: vec![vec![
                MapPosition::new(45.0, 25.0),
                MapPosition::new(45.1, 25.1),
            ]],
        },
        directions: steps
            .iter()
            .map(|(text, length)| DirectionStep::new(*text, *length))
            .collect(),
    }
}

pub fn solution(routes: Vec<RouteResult>) -> RouteSolution {
    RouteSolution { routes }
}

pub fn tourism_feature(id: i64, name: &str) -> HitFeature {
    let mut attrs = Map::new();
    attrs.insert("F_id".into(), json!(id));
    attrs.insert("name".into(), json!(name));
    HitFeature::feature(KnownLayer::Tourism.title(), attrs)
}
