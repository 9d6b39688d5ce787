//! Feedback lookup: submit and view flows.
//!
//! Both flows start with a hit-test at the click position and resolve the
//! topmost feature into a [`FeedbackTarget`]. Submit opens an input form for
//! that target; view loads the target's entries and lists them. Each lookup
//! carries a generation so answers to a superseded click are dropped.

use crate::effect::{Effect, Effects, LookupPurpose, Request};
use gm_core::{
    FeedError, FeedbackEntry, FeedbackTarget, HitFeature, LayerKind, LookupError, PanelAction,
    PanelAnchor, ScreenPosition, UiPanel, resolve_target,
};
use log::{debug, warn};

/// Anchor of the read-only feedback list.
pub const VIEW_ANCHOR: PanelAnchor = PanelAnchor::BottomLeft;
/// Anchor of the feedback input form.
pub const FORM_ANCHOR: PanelAnchor = PanelAnchor::Manual;

#[derive(Debug, Default)]
pub struct FeedbackFlow {
    generation: u64,
    /// Target of the open input form.
    draft: Option<FeedbackTarget>,
}

impl FeedbackFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> Option<&FeedbackTarget> {
        self.draft.as_ref()
    }

    /// Drop whatever lookup is in flight.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Start a lookup at `screen`.
    pub fn lookup(&mut self, purpose: LookupPurpose, screen: ScreenPosition) -> Effect {
        self.generation += 1;
        Effect::Request(Request::HitTest {
            purpose,
            generation: self.generation,
            screen,
        })
    }

    /// Continue a lookup once the hit-test answered.
    pub fn on_hit(
        &mut self,
        purpose: LookupPurpose,
        generation: u64,
        result: Result<Vec<HitFeature>, LookupError>,
    ) -> Effects {
        let mut effects = Effects::new();
        if generation != self.generation {
            debug!("discarding hit-test for superseded click (generation {generation})");
            return effects;
        }

        let hits = match result {
            Ok(hits) => hits,
            Err(e) => {
                warn!("{e}");
                return effects;
            }
        };
        let Some(top) = hits.first() else {
            return effects;
        };
        if top.layer_kind != LayerKind::Feature {
            debug!("topmost hit on `{}` is not a feature layer", top.layer_title);
            return effects;
        }

        let target = match resolve_target(top) {
            Ok(target) => target,
            Err(e @ LookupError::UnknownLayer(_)) => {
                warn!("{e}");
                return effects;
            }
            Err(e) => {
                debug!("{e}");
                return effects;
            }
        };
        debug!("{purpose:?} lookup resolved to {:?}", target.subject);

        match purpose {
            LookupPurpose::Submit => {
                effects.push(Effect::clear(FORM_ANCHOR));
                effects.push(Effect::show(FORM_ANCHOR, submit_form(&target)));
                self.draft = Some(target);
            }
            LookupPurpose::View => {
                effects.push(Effect::Request(Request::QueryFeedback { generation, target }));
            }
        }
        effects
    }

    /// Show the entries loaded for a view lookup.
    pub fn on_entries(
        &mut self,
        generation: u64,
        target: &FeedbackTarget,
        result: Result<Vec<FeedbackEntry>, FeedError>,
    ) -> Effects {
        let mut effects = Effects::new();
        if generation != self.generation {
            debug!("discarding feedback for superseded click (generation {generation})");
            return effects;
        }
        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                warn!("feedback query failed: {e}");
                return effects;
            }
        };
        if entries.is_empty() {
            debug!("no feedback for {:?}", target.subject);
            return effects;
        }

        let panel = entries
            .iter()
            .fold(UiPanel::titled(format!("Feedback {}", target.display_name)), |p, e| {
                p.item(e.text.clone())
            });
        effects.push(Effect::clear(VIEW_ANCHOR));
        effects.push(Effect::show(VIEW_ANCHOR, panel));
        effects
    }

    /// Submit the open form. Returns `None` if no form is open.
    pub fn confirm(&mut self, text: &str) -> Option<Effects> {
        let Some(target) = self.draft.take() else {
            warn!("feedback confirmed with no open form");
            return None;
        };
        let mut effects = Effects::new();
        effects.push(Effect::Request(Request::WriteFeedback(FeedbackEntry {
            text: text.to_string(),
            subject: target.subject,
        })));
        effects.push(Effect::clear(FORM_ANCHOR));
        Some(effects)
    }

    /// Close the open form without writing.
    pub fn cancel(&mut self) -> Effects {
        self.draft = None;
        let mut effects = Effects::new();
        effects.push(Effect::clear(FORM_ANCHOR));
        effects
    }
}

fn submit_form(target: &FeedbackTarget) -> UiPanel {
    UiPanel::titled(format!("Feedback form for {}", target.display_name))
        .input("Feedback")
        .action("Send", PanelAction::ConfirmFeedback)
        .action("Close", PanelAction::CancelFeedback)
}
