//! Interaction modes and click dispatch.
//!
//! The controller holds the single active [`InteractionMode`] and routes
//! each map click to exactly one behavior:
//!
//! | Mode | Click does |
//! |------|------------|
//! | **AddPoint** | push a point at the click to the feed (rendered when echoed back) |
//! | **DrawRoute** | route capture step |
//! | **InspectFeedback** | hit-test, open the feedback form for the feature |
//! | **Idle** | hit-test, list the feature's feedback |

use crate::effect::{Effect, Effects, LookupPurpose, Outcome, Request};
use crate::feedback::FeedbackFlow;
use crate::history::HistoryFlow;
use crate::input::ClickEvent;
use crate::route::{DIRECTIONS_ANCHOR, RoutePipeline};
use gm_core::{ConfigError, GeoPoint, MapConfig, MapPosition, OwnerId, PanelAnchor, Rgb};
use log::{debug, info, warn};

/// The active interaction mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    AddPoint,
    DrawRoute,
    InspectFeedback,
}

impl InteractionMode {
    /// Panels owned by other modes that a click in this mode clears.
    fn stale_anchors(self) -> &'static [PanelAnchor] {
        match self {
            InteractionMode::DrawRoute => &[PanelAnchor::BottomLeft],
            _ => &[PanelAnchor::BottomLeft, PanelAnchor::BottomRight],
        }
    }
}

pub struct InteractionController {
    mode: InteractionMode,
    color: Rgb,
    owner: Option<OwnerId>,
    route: RoutePipeline,
    feedback: FeedbackFlow,
    history: HistoryFlow,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            mode: InteractionMode::Idle,
            color: Rgb::new(255, 165, 0),
            owner: None,
            route: RoutePipeline::default(),
            feedback: FeedbackFlow::new(),
            history: HistoryFlow::new(),
        }
    }
}

impl InteractionController {
    pub fn new(config: &MapConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            color: config.default_rgb()?,
            route: RoutePipeline::new(config.path_style),
            ..Self::default()
        })
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<OwnerId>) {
        self.owner = owner;
    }

    pub fn route(&self) -> &RoutePipeline {
        &self.route
    }

    pub fn feedback(&self) -> &FeedbackFlow {
        &self.feedback
    }

    pub fn history(&self) -> &HistoryFlow {
        &self.history
    }

    /// Select the color for new points. Returns `None` (and keeps the
    /// current color) if `hex` is not a valid color.
    pub fn set_color(&mut self, hex: &str) -> Option<Rgb> {
        match Rgb::from_hex(hex) {
            Some(color) => {
                self.color = color;
                Some(color)
            }
            None => {
                warn!("ignoring invalid color `{hex}`");
                None
            }
        }
    }

    /// Toggle `requested`: selecting the active mode returns to Idle,
    /// selecting another mode replaces the active one.
    pub fn set_mode(&mut self, requested: InteractionMode) -> Effects {
        let previous = self.mode;
        let next = if requested == previous {
            InteractionMode::Idle
        } else {
            requested
        };

        let mut effects = Effects::new();
        if next == previous {
            return effects;
        }

        match previous {
            InteractionMode::InspectFeedback => effects.extend(self.feedback.cancel()),
            InteractionMode::DrawRoute => self.route.invalidate(),
            _ => {}
        }
        effects.push(Effect::clear(DIRECTIONS_ANCHOR));
        self.feedback.invalidate();

        info!("mode {previous:?} -> {next:?}");
        self.mode = next;
        effects
    }

    /// Dispatch a map click according to the active mode.
    pub fn handle_click(&mut self, click: &ClickEvent) -> Effects {
        debug!(
            "click at {:.6}, {:.6} in {:?}",
            click.map.latitude, click.map.longitude, self.mode
        );
        self.feedback.invalidate();

        let mut effects: Effects = self
            .mode
            .stale_anchors()
            .iter()
            .map(|anchor| Effect::clear(*anchor))
            .collect();

        match self.mode {
            InteractionMode::AddPoint => effects.extend(self.add_point_at(click.map)),
            InteractionMode::DrawRoute => effects.extend(self.route.capture(click.map)),
            InteractionMode::InspectFeedback => {
                effects.push(self.feedback.lookup(LookupPurpose::Submit, click.screen));
            }
            InteractionMode::Idle => {
                effects.push(self.feedback.lookup(LookupPurpose::View, click.screen));
            }
        }
        effects
    }

    /// Push a point at `at` with the selected color. No local render: the
    /// point shows up when the feed echoes it back.
    pub fn add_point_at(&self, at: MapPosition) -> Effects {
        let mut effects = Effects::new();
        match self.owner {
            Some(owner) => effects.push(Effect::Request(Request::PushPoint(GeoPoint::new(
                at, self.color, owner,
            )))),
            None => debug!("point not added: no owner"),
        }
        effects
    }

    /// Remove every point the current owner has stored.
    pub fn clear_points(&self) -> Effects {
        let mut effects = Effects::new();
        if let Some(owner) = self.owner {
            effects.push(Effect::Request(Request::RemoveOwnedPoints(owner)));
        }
        effects
    }

    pub fn clear_route(&mut self) -> Effects {
        self.route.clear()
    }

    /// Submit the open feedback form and leave InspectFeedback. Without an
    /// open form nothing changes.
    pub fn confirm_feedback(&mut self, text: &str) -> Effects {
        let Some(effects) = self.feedback.confirm(text) else {
            return Effects::new();
        };
        self.leave_inspect();
        effects
    }

    /// Close the feedback form and leave InspectFeedback.
    pub fn cancel_feedback(&mut self) -> Effects {
        let effects = self.feedback.cancel();
        self.leave_inspect();
        effects
    }

    pub fn record_search(&mut self, searched: &str) -> Effects {
        self.history.record(self.owner, searched)
    }

    pub fn toggle_history(&mut self) -> Effects {
        self.history.toggle(self.owner)
    }

    /// Feed the result of a finished request back into the state machines.
    pub fn apply(&mut self, outcome: Outcome) -> Effects {
        match outcome {
            Outcome::RouteSolved { generation, result } => self.route.resolve(generation, result),
            Outcome::HitTested {
                purpose,
                generation,
                result,
            } => self.feedback.on_hit(purpose, generation, result),
            Outcome::FeedbackLoaded {
                generation,
                target,
                result,
            } => self.feedback.on_entries(generation, &target, result),
            Outcome::HistoryLoaded { generation, result } => {
                self.history.on_loaded(generation, result)
            }
            Outcome::Stored { what, result } => {
                match result {
                    Ok(()) => debug!("{what} stored"),
                    Err(e) => warn!("{what} failed: {e}"),
                }
                Effects::new()
            }
        }
    }

    fn leave_inspect(&mut self) {
        if self.mode == InteractionMode::InspectFeedback {
            info!("mode {:?} -> {:?}", self.mode, InteractionMode::Idle);
            self.mode = InteractionMode::Idle;
        }
    }
}
