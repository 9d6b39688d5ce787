//! Search history: records what the owner searched for and shows it on demand.

use crate::effect::{Effect, Effects, Request};
use gm_core::{FeedError, OwnerId, PanelAnchor, SearchRecord, UiPanel};
use log::{debug, warn};

pub const HISTORY_ANCHOR: PanelAnchor = PanelAnchor::TopRight;

#[derive(Debug, Default)]
pub struct HistoryFlow {
    generation: u64,
    open: bool,
}

impl HistoryFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Store a completed search and close the panel.
    pub fn record(&mut self, owner: Option<OwnerId>, searched: &str) -> Effects {
        let mut effects = self.close();
        match owner {
            Some(user) => effects.push(Effect::Request(Request::PushSearch(SearchRecord {
                searched: searched.to_string(),
                user,
            }))),
            None => debug!("search `{searched}` not recorded: no owner"),
        }
        effects
    }

    /// Close the panel if open, otherwise load and show it.
    pub fn toggle(&mut self, owner: Option<OwnerId>) -> Effects {
        if self.open {
            return self.close();
        }
        let mut effects = Effects::new();
        let Some(owner) = owner else {
            debug!("history requested with no owner");
            return effects;
        };
        self.generation += 1;
        effects.push(Effect::clear(PanelAnchor::BottomRight));
        effects.push(Effect::Request(Request::QueryHistory {
            generation: self.generation,
            owner,
        }));
        effects
    }

    pub fn on_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<SearchRecord>, FeedError>,
    ) -> Effects {
        let mut effects = Effects::new();
        if generation != self.generation {
            debug!("discarding superseded history (generation {generation})");
            return effects;
        }
        let records = match result {
            Ok(records) => records,
            Err(e) => {
                warn!("history query failed: {e}");
                return effects;
            }
        };
        if records.is_empty() {
            return effects;
        }
        let panel = records
            .iter()
            .fold(UiPanel::titled("History"), |p, r| p.item(r.searched.clone()));
        effects.push(Effect::clear(HISTORY_ANCHOR));
        effects.push(Effect::show(HISTORY_ANCHOR, panel));
        self.open = true;
        effects
    }

    fn close(&mut self) -> Effects {
        // Also drops a load that is still in flight.
        self.generation += 1;
        let mut effects = Effects::new();
        if std::mem::take(&mut self.open) {
            effects.push(Effect::clear(HISTORY_ANCHOR));
        }
        effects
    }
}
