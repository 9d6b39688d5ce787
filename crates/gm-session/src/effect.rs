//! Effects and outcomes: the vocabulary between the state machines and the
//! session driver.
//!
//! State machines never touch collaborators. They return `Effects`; the
//! session applies map and panel effects immediately and turns requests into
//! in-flight futures whose results come back as `Outcome`s.

use gm_core::{
    FeedError, FeedbackEntry, FeedbackTarget, GeoPoint, HitFeature, LookupError, MapPosition,
    OwnerId, PanelAnchor, PathStyle, Polyline, RouteError, RouteSolution, ScreenPosition,
    SearchRecord, UiPanel, Waypoint,
};
use smallvec::SmallVec;

/// Graphics changes on the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    ClearPoints,
    AddPoint(GeoPoint),
    RemovePoint(GeoPoint),
    AddWaypoint(Waypoint),
    DrawRoute { geometry: Polyline, style: PathStyle },
    /// Remove waypoint markers and route paths.
    ClearRouteGraphics,
}

/// Overlay panel changes.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOp {
    Show { anchor: PanelAnchor, panel: UiPanel },
    Clear(PanelAnchor),
}

/// Which feedback flow a hit-test feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPurpose {
    Submit,
    View,
}

/// Asynchronous work for the session to start.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    PushPoint(GeoPoint),
    WriteFeedback(FeedbackEntry),
    PushSearch(SearchRecord),
    /// Remove every point record owned by this owner.
    RemoveOwnedPoints(OwnerId),
    SolveRoute {
        generation: u64,
        stops: [MapPosition; 2],
    },
    HitTest {
        purpose: LookupPurpose,
        generation: u64,
        screen: ScreenPosition,
    },
    QueryFeedback {
        generation: u64,
        target: FeedbackTarget,
    },
    QueryHistory {
        generation: u64,
        owner: OwnerId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Map(MapOp),
    Panel(PanelOp),
    Request(Request),
}

impl Effect {
    pub fn show(anchor: PanelAnchor, panel: UiPanel) -> Self {
        Effect::Panel(PanelOp::Show { anchor, panel })
    }

    pub fn clear(anchor: PanelAnchor) -> Self {
        Effect::Panel(PanelOp::Clear(anchor))
    }
}

pub type Effects = SmallVec<[Effect; 4]>;

/// Result of a finished request, fed back into the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    RouteSolved {
        generation: u64,
        result: Result<RouteSolution, RouteError>,
    },
    HitTested {
        purpose: LookupPurpose,
        generation: u64,
        result: Result<Vec<HitFeature>, LookupError>,
    },
    FeedbackLoaded {
        generation: u64,
        target: FeedbackTarget,
        result: Result<Vec<FeedbackEntry>, FeedError>,
    },
    HistoryLoaded {
        generation: u64,
        result: Result<Vec<SearchRecord>, FeedError>,
    },
    /// A fire-and-forget write finished.
    Stored {
        what: &'static str,
        result: Result<(), FeedError>,
    },
}
