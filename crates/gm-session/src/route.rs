//! Two-click route capture and solving.
//!
//! ```text
//! NoWaypoints ──click──▶ HasOrigin ──click──▶ HasBoth ──click──▶ HasOrigin
//!                                    (solve)        (reset + new origin)
//! ```
//!
//! Entering `HasBoth` stamps a fresh generation and requests a solve. A solve
//! result is only rendered while the pipeline is still in `HasBoth` for that
//! same generation, so a slow answer that arrives after a reset is dropped.

use crate::effect::{Effect, Effects, MapOp, Request};
use gm_core::{
    MapPosition, PanelAnchor, PathStyle, RouteError, RouteResult, RouteSolution, UiPanel,
    Waypoint, WaypointRole, miles_to_km,
};
use log::{debug, info, warn};

/// Anchor of the directions panel.
pub const DIRECTIONS_ANCHOR: PanelAnchor = PanelAnchor::BottomRight;

#[derive(Debug, Clone, PartialEq)]
pub enum RouteState {
    NoWaypoints,
    HasOrigin {
        origin: Waypoint,
    },
    HasBoth {
        origin: Waypoint,
        destination: Waypoint,
        generation: u64,
        /// The rendered route, once the solver answered.
        solved: Option<RouteResult>,
    },
}

pub struct RoutePipeline {
    state: RouteState,
    generation: u64,
    style: PathStyle,
}

impl Default for RoutePipeline {
    fn default() -> Self {
        Self::new(PathStyle::default())
    }
}

impl RoutePipeline {
    pub fn new(style: PathStyle) -> Self {
        Self {
            state: RouteState::NoWaypoints,
            generation: 0,
            style,
        }
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    /// Captured waypoints, origin first.
    pub fn waypoints(&self) -> Vec<Waypoint> {
        match &self.state {
            RouteState::NoWaypoints => Vec::new(),
            RouteState::HasOrigin { origin } => vec![*origin],
            RouteState::HasBoth {
                origin,
                destination,
                ..
            } => vec![*origin, *destination],
        }
    }

    /// The currently rendered route, if any.
    pub fn route(&self) -> Option<&RouteResult> {
        match &self.state {
            RouteState::HasBoth { solved, .. } => solved.as_ref(),
            _ => None,
        }
    }

    /// Total length of the rendered route in kilometers.
    pub fn distance_km(&self) -> Option<f64> {
        self.route().map(|r| miles_to_km(r.total_length()))
    }

    /// Handle a capture click at `at`.
    pub fn capture(&mut self, at: MapPosition) -> Effects {
        let mut effects = Effects::new();
        let state = std::mem::replace(&mut self.state, RouteState::NoWaypoints);

        match state {
            RouteState::NoWaypoints => {
                self.place_origin(at, &mut effects);
            }
            RouteState::HasOrigin { origin } => {
                let destination = Waypoint {
                    role: WaypointRole::Destination,
                    position: at,
                };
                self.generation += 1;
                let generation = self.generation;
                effects.push(Effect::Map(MapOp::AddWaypoint(destination)));
                effects.push(Effect::Request(Request::SolveRoute {
                    generation,
                    stops: [origin.position, destination.position],
                }));
                debug!("route capture complete, solving (generation {generation})");
                self.state = RouteState::HasBoth {
                    origin,
                    destination,
                    generation,
                    solved: None,
                };
            }
            RouteState::HasBoth { .. } => {
                effects.extend(reset_effects());
                self.place_origin(at, &mut effects);
            }
        }

        effects
    }

    /// Drop the answer of a solve still in flight. Waypoints stay.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Drop waypoints and any rendered route.
    pub fn clear(&mut self) -> Effects {
        self.state = RouteState::NoWaypoints;
        reset_effects().into_iter().collect()
    }

    /// Apply a solver answer for `generation`.
    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<RouteSolution, RouteError>,
    ) -> Effects {
        let mut effects = Effects::new();

        let RouteState::HasBoth {
            generation: current,
            solved,
            ..
        } = &mut self.state
        else {
            debug!("discarding route for generation {generation}: capture was reset");
            return effects;
        };
        if *current != generation || self.generation != generation || solved.is_some() {
            debug!("discarding stale route for generation {generation} (current {current})");
            return effects;
        }

        let solution = match result {
            Ok(solution) => solution,
            Err(e) => {
                warn!("route solve failed: {e}");
                return effects;
            }
        };

        // First alternative in response order wins.
        let Some(route) = solution.routes.into_iter().next() else {
            warn!("route service returned no alternatives");
            return effects;
        };

        effects.push(Effect::Map(MapOp::DrawRoute {
            geometry: route.geometry.clone(),
            style: self.style,
        }));
        effects.push(Effect::clear(DIRECTIONS_ANCHOR));
        effects.push(Effect::show(DIRECTIONS_ANCHOR, directions_panel(&route)));

        info!(
            "route solved: {} steps, dist (km) = {:.3}",
            route.directions.len(),
            miles_to_km(route.total_length())
        );
        *solved = Some(route);
        effects
    }

    fn place_origin(&mut self, at: MapPosition, effects: &mut Effects) {
        let origin = Waypoint {
            role: WaypointRole::Origin,
            position: at,
        };
        effects.push(Effect::Map(MapOp::AddWaypoint(origin)));
        self.state = RouteState::HasOrigin { origin };
    }
}

fn reset_effects() -> [Effect; 2] {
    [
        Effect::Map(MapOp::ClearRouteGraphics),
        Effect::clear(DIRECTIONS_ANCHOR),
    ]
}

/// One item per step: `"<text> (<length> miles)"`.
pub fn directions_panel(route: &RouteResult) -> UiPanel {
    route
        .directions
        .iter()
        .fold(UiPanel::new(), |panel, step| {
            panel.item(format!("{} ({} miles)", step.text, step.length))
        })
}
