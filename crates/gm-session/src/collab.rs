//! Narrow interfaces to the external collaborators: the map surface, the
//! realtime data store, the route solver and the overlay panel host.
//!
//! Everything runs on one event loop, so none of these need to be `Send`.

use async_trait::async_trait;
use futures::stream::LocalBoxStream;
use gm_core::{
    FeedError, FeedRecord, GeoPoint, HitFeature, LookupError, MapPosition, PanelAnchor, PathStyle,
    Polyline, RouteError, RouteSolution, ScreenPosition, UiPanel, Waypoint,
};

/// Stream of full collection snapshots.
pub type SnapshotStream = LocalBoxStream<'static, Result<Vec<FeedRecord>, FeedError>>;

/// The rendered map.
#[async_trait(?Send)]
pub trait MapSurface {
    fn add_point(&self, point: &GeoPoint);
    fn remove_point(&self, point: &GeoPoint);
    fn clear_points(&self);

    fn add_waypoint(&self, waypoint: &Waypoint);
    fn draw_route(&self, geometry: &Polyline, style: &PathStyle);
    /// Remove waypoint markers and route paths.
    fn clear_route_graphics(&self);

    fn camera_center(&self) -> MapPosition;

    /// Features under `screen`, topmost first.
    async fn hit_test(&self, screen: ScreenPosition) -> Result<Vec<HitFeature>, LookupError>;
}

/// The realtime data store.
#[async_trait(?Send)]
pub trait RealtimeFeed {
    /// Live subscription to the records of `collection` whose `filter_key`
    /// equals `filter_value`. Every item is the full matching set.
    fn subscribe(&self, collection: &str, filter_key: &str, filter_value: &str) -> SnapshotStream;

    async fn push(&self, collection: &str, record: serde_json::Value) -> Result<(), FeedError>;

    async fn remove(&self, collection: &str, key: &str) -> Result<(), FeedError>;

    /// Like `subscribe`, for callers that only read the first item.
    fn query_once(&self, collection: &str, filter_key: &str, filter_value: &str)
    -> SnapshotStream;
}

/// Parameters of a route solve request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteParams {
    /// Ordered stops, origin first.
    pub stops: Vec<MapPosition>,
    pub return_directions: bool,
}

/// External route-solving service.
#[async_trait(?Send)]
pub trait RouteSolver {
    async fn solve(&self, service_url: &str, params: &RouteParams)
    -> Result<RouteSolution, RouteError>;
}

/// Host for overlay panels. Each anchor holds at most one panel.
pub trait PanelHost {
    fn add(&self, anchor: PanelAnchor, panel: UiPanel);
    fn clear(&self, anchor: PanelAnchor);
    fn remove_all(&self);
}
