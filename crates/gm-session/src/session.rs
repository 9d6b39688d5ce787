//! The session driver: one event loop, no threads.
//!
//! The session owns the controller, the feed reconciler and the
//! collaborators. Controller calls return `Effects`; map and panel effects
//! are applied on the spot, requests become in-flight futures. Completed
//! futures resolve to `Outcome`s which go back through the controller.
//! Nothing is cancelled and nothing times out: a superseded request still
//! completes, and the state machines decide whether its result still
//! matters.

use crate::collab::{MapSurface, PanelHost, RealtimeFeed, RouteParams, RouteSolver, SnapshotStream};
use crate::controller::{InteractionController, InteractionMode};
use crate::effect::{Effect, Effects, MapOp, Outcome, PanelOp, Request};
use crate::feed::{FeedReconciler, GeoPointStore, Reconcile, WholesaleReplace};
use crate::input::{ClickEvent, InputEvent};
use crate::ticker::PeriodicTask;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use gm_core::{ConfigError, FeedError, FeedRecord, MapConfig, OwnerId, Rgb};
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::rc::Rc;
use tokio::sync::mpsc;

/// The external collaborators a session drives.
#[derive(Clone)]
pub struct Collaborators {
    pub map: Rc<dyn MapSurface>,
    pub feed: Rc<dyn RealtimeFeed>,
    pub router: Rc<dyn RouteSolver>,
    pub panels: Rc<dyn PanelHost>,
}

/// Everything the UI layer can ask of a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Input(InputEvent),
    SetMode(InteractionMode),
    SetColor(String),
    AddPointAtCenter,
    ClearPoints,
    ClearRoute,
    ConfirmFeedback(String),
    CancelFeedback,
    SearchCompleted(String),
    ToggleHistory,
    Connect(OwnerId),
    Disconnect,
    Shutdown,
}

pub struct Session<R: Reconcile = WholesaleReplace> {
    config: Rc<MapConfig>,
    collab: Collaborators,
    controller: InteractionController,
    reconciler: FeedReconciler<R>,
    subscription: Option<SnapshotStream>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Outcome>>,
    refresh: Option<PeriodicTask>,
}

impl Session<WholesaleReplace> {
    pub fn new(config: MapConfig, collab: Collaborators) -> Result<Self, ConfigError> {
        Self::with_strategy(config, collab, WholesaleReplace)
    }
}

impl<R: Reconcile> Session<R> {
    pub fn with_strategy(
        config: MapConfig,
        collab: Collaborators,
        strategy: R,
    ) -> Result<Self, ConfigError> {
        let controller = InteractionController::new(&config)?;
        info!(
            "session ready: center {:.4}, {:.4} zoom {}",
            config.center.latitude, config.center.longitude, config.zoom
        );
        Ok(Self {
            config: Rc::new(config),
            collab,
            controller,
            reconciler: FeedReconciler::new(strategy),
            subscription: None,
            in_flight: FuturesUnordered::new(),
            refresh: None,
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn mode(&self) -> InteractionMode {
        self.controller.mode()
    }

    pub fn store(&self) -> &GeoPointStore {
        self.reconciler.store()
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// Number of requests still waiting on a collaborator.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    // ─── Feed lifecycle ──────────────────────────────────────────────────

    /// Subscribe to `owner`'s points. No-op if already connected.
    pub fn connect(&mut self, owner: OwnerId) {
        if !self.reconciler.connect(owner) {
            return;
        }
        self.controller.set_owner(Some(owner));
        self.subscription = Some(self.collab.feed.subscribe(
            &self.config.points_collection,
            &self.config.owner_field,
            owner.as_str(),
        ));
    }

    /// Drop the subscription. Safe to call when not connected.
    pub fn disconnect(&mut self) {
        self.reconciler.disconnect();
        self.subscription = None;
    }

    /// Wait for the next feed emission and reconcile it. Returns `false`
    /// when there is no live subscription (never connected, ended, or
    /// failed).
    pub async fn pump_feed(&mut self) -> bool {
        if self.subscription.is_none() {
            return false;
        }
        let emission = next_emission(&mut self.subscription).await;
        self.on_emission(emission)
    }

    fn on_emission(&mut self, emission: Option<Result<Vec<FeedRecord>, FeedError>>) -> bool {
        match emission {
            Some(Ok(records)) => {
                let effects = self.reconciler.on_emission(Ok(records));
                self.apply(effects);
                true
            }
            Some(Err(e)) => {
                // No auto-reconnect: the last snapshot stays on the map.
                self.reconciler.on_emission(Err(e));
                self.disconnect();
                false
            }
            None => {
                warn!("feed subscription ended");
                self.disconnect();
                false
            }
        }
    }

    // ─── Interaction ─────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: InteractionMode) {
        let effects = self.controller.set_mode(mode);
        self.apply(effects);
    }

    pub fn set_color(&mut self, hex: &str) -> Option<Rgb> {
        self.controller.set_color(hex)
    }

    pub fn handle_click(&mut self, click: ClickEvent) {
        let effects = self.controller.handle_click(&click);
        self.apply(effects);
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Click(click) => self.handle_click(click),
            InputEvent::PointerMove { map, shift: true } => {
                debug!("map moved: {}, {}", map.longitude, map.latitude);
            }
            InputEvent::PointerMove { .. } => {}
        }
    }

    /// Push a point at the camera center with the selected color.
    pub fn add_point_at_center(&mut self) {
        let center = self.collab.map.camera_center();
        info!(
            "map center: {}, {} color={}",
            center.latitude,
            center.longitude,
            self.controller.color().to_hex()
        );
        let effects = self.controller.add_point_at(center);
        self.apply(effects);
    }

    pub fn clear_points(&mut self) {
        let effects = self.controller.clear_points();
        self.apply(effects);
    }

    pub fn clear_route(&mut self) {
        let effects = self.controller.clear_route();
        self.apply(effects);
    }

    pub fn confirm_feedback(&mut self, text: &str) {
        let effects = self.controller.confirm_feedback(text);
        self.apply(effects);
    }

    pub fn cancel_feedback(&mut self) {
        let effects = self.controller.cancel_feedback();
        self.apply(effects);
    }

    pub fn record_search(&mut self, searched: &str) {
        let effects = self.controller.record_search(searched);
        self.apply(effects);
    }

    pub fn toggle_history(&mut self) {
        let effects = self.controller.toggle_history();
        self.apply(effects);
    }

    /// Drive every in-flight request to completion, including requests
    /// spawned by the outcomes of earlier ones.
    pub async fn settle(&mut self) {
        while let Some(outcome) = self.in_flight.next().await {
            self.complete(outcome);
        }
    }

    // ─── Event loop ──────────────────────────────────────────────────────

    /// Run until `Shutdown` or until the event channel closes.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<UiEvent>) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    None | Some(UiEvent::Shutdown) => break,
                    Some(event) => self.dispatch(event),
                },
                Some(outcome) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(outcome);
                }
                emission = next_emission(&mut self.subscription), if self.subscription.is_some() => {
                    self.on_emission(emission);
                }
            }
        }
        self.shutdown().await;
    }

    pub fn dispatch(&mut self, event: UiEvent) {
        match event {
            UiEvent::Input(input) => self.handle_input(input),
            UiEvent::SetMode(mode) => self.set_mode(mode),
            UiEvent::SetColor(hex) => {
                self.set_color(&hex);
            }
            UiEvent::AddPointAtCenter => self.add_point_at_center(),
            UiEvent::ClearPoints => self.clear_points(),
            UiEvent::ClearRoute => self.clear_route(),
            UiEvent::ConfirmFeedback(text) => self.confirm_feedback(&text),
            UiEvent::CancelFeedback => self.cancel_feedback(),
            UiEvent::SearchCompleted(text) => self.record_search(&text),
            UiEvent::ToggleHistory => self.toggle_history(),
            UiEvent::Connect(owner) => self.connect(owner),
            UiEvent::Disconnect => self.disconnect(),
            UiEvent::Shutdown => {}
        }
    }

    /// Start the background refresh task at the configured period. Replaces
    /// a running one.
    pub fn start_refresh<F>(&mut self, tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.refresh = Some(PeriodicTask::spawn(self.config.refresh_interval(), tick));
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.as_ref().is_some_and(PeriodicTask::is_running)
    }

    /// Stop the refresh task, drop the subscription and clear all panels.
    pub async fn shutdown(&mut self) {
        if let Some(mut refresh) = self.refresh.take() {
            refresh.stop().await;
        }
        self.disconnect();
        self.collab.panels.remove_all();
        info!("session shut down ({} requests abandoned)", self.in_flight.len());
    }

    // ─── Effect application ──────────────────────────────────────────────

    fn complete(&mut self, outcome: Outcome) {
        let effects = self.controller.apply(outcome);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Effects) {
        for effect in effects {
            match effect {
                Effect::Map(op) => self.apply_map(op),
                Effect::Panel(op) => self.apply_panel(op),
                Effect::Request(request) => {
                    let fut = self.start(request);
                    self.in_flight.push(fut);
                }
            }
        }
    }

    fn apply_map(&self, op: MapOp) {
        let map = &self.collab.map;
        match op {
            MapOp::ClearPoints => map.clear_points(),
            MapOp::AddPoint(point) => map.add_point(&point),
            MapOp::RemovePoint(point) => map.remove_point(&point),
            MapOp::AddWaypoint(waypoint) => map.add_waypoint(&waypoint),
            MapOp::DrawRoute { geometry, style } => map.draw_route(&geometry, &style),
            MapOp::ClearRouteGraphics => map.clear_route_graphics(),
        }
    }

    fn apply_panel(&self, op: PanelOp) {
        match op {
            PanelOp::Show { anchor, panel } => self.collab.panels.add(anchor, panel),
            PanelOp::Clear(anchor) => self.collab.panels.clear(anchor),
        }
    }

    fn start(&self, request: Request) -> LocalBoxFuture<'static, Outcome> {
        let config = Rc::clone(&self.config);
        let feed = Rc::clone(&self.collab.feed);

        match request {
            Request::PushPoint(point) => async move {
                let result = push(&*feed, &config.points_collection, &point).await;
                Outcome::Stored {
                    what: "point",
                    result,
                }
            }
            .boxed_local(),

            Request::WriteFeedback(entry) => async move {
                let result = push(&*feed, &config.feedback_collection, &entry).await;
                Outcome::Stored {
                    what: "feedback",
                    result,
                }
            }
            .boxed_local(),

            Request::PushSearch(record) => async move {
                let result = push(&*feed, &config.history_collection, &record).await;
                Outcome::Stored {
                    what: "search history",
                    result,
                }
            }
            .boxed_local(),

            Request::RemoveOwnedPoints(owner) => async move {
                let result = async {
                    let stream = feed.query_once(
                        &config.points_collection,
                        &config.owner_field,
                        owner.as_str(),
                    );
                    let records = first_snapshot(stream).await?;
                    for record in &records {
                        feed.remove(&config.points_collection, &record.key).await?;
                    }
                    debug!("removed {} points of {owner:?}", records.len());
                    Ok::<(), FeedError>(())
                }
                .await;
                Outcome::Stored {
                    what: "clear points",
                    result,
                }
            }
            .boxed_local(),

            Request::SolveRoute { generation, stops } => {
                let router = Rc::clone(&self.collab.router);
                async move {
                    let params = RouteParams {
                        stops: stops.to_vec(),
                        return_directions: true,
                    };
                    let result = router.solve(&config.route_service_url, &params).await;
                    Outcome::RouteSolved { generation, result }
                }
                .boxed_local()
            }

            Request::HitTest {
                purpose,
                generation,
                screen,
            } => {
                let map = Rc::clone(&self.collab.map);
                async move {
                    let result = map.hit_test(screen).await;
                    Outcome::HitTested {
                        purpose,
                        generation,
                        result,
                    }
                }
                .boxed_local()
            }

            Request::QueryFeedback { generation, target } => async move {
                let stream = feed.query_once(
                    &config.feedback_collection,
                    &config.subject_field,
                    target.subject.as_str(),
                );
                let result = first_snapshot(stream).await.map(|records| decode_all(&records));
                Outcome::FeedbackLoaded {
                    generation,
                    target,
                    result,
                }
            }
            .boxed_local(),

            Request::QueryHistory { generation, owner } => async move {
                let stream = feed.query_once(
                    &config.history_collection,
                    &config.owner_field,
                    owner.as_str(),
                );
                let result = first_snapshot(stream).await.map(|records| decode_all(&records));
                Outcome::HistoryLoaded { generation, result }
            }
            .boxed_local(),
        }
    }
}

async fn next_emission(
    subscription: &mut Option<SnapshotStream>,
) -> Option<Result<Vec<FeedRecord>, FeedError>> {
    match subscription {
        Some(stream) => stream.next().await,
        None => None,
    }
}

/// First item of a query stream; an empty stream means no records.
async fn first_snapshot(mut stream: SnapshotStream) -> Result<Vec<FeedRecord>, FeedError> {
    stream.next().await.unwrap_or_else(|| Ok(Vec::new()))
}

async fn push<T: Serialize>(
    feed: &dyn RealtimeFeed,
    collection: &str,
    record: &T,
) -> Result<(), FeedError> {
    let value = serde_json::to_value(record).map_err(|e| FeedError::Malformed {
        key: collection.to_string(),
        reason: e.to_string(),
    })?;
    feed.push(collection, value).await
}

/// Decode records, skipping (and logging) the ones that don't fit `T`.
fn decode_all<T: DeserializeOwned>(records: &[FeedRecord]) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match record.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("skipping malformed record `{}`: {e}", record.key);
                None
            }
        })
        .collect()
}
