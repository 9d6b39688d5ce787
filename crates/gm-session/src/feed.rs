//! Realtime feed reconciliation.
//!
//! The remote point collection is the single source of truth. Each emission
//! of the subscription is a complete snapshot for the owner scope; the
//! reconciler turns it into map operations through a [`Reconcile`] strategy
//! and records it in the [`GeoPointStore`]. After every emission the store
//! holds exactly the points of that snapshot.

use crate::effect::{Effect, Effects, MapOp};
use gm_core::{FeedError, FeedRecord, FeedSnapshot, GeoPoint, OwnerId, PointKey};
use log::{debug, info, warn};
use std::collections::HashSet;

/// The locally rendered annotation points.
#[derive(Debug, Default)]
pub struct GeoPointStore {
    points: Vec<GeoPoint>,
}

impl GeoPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Strategy for moving the store (and the map) from one snapshot to the next.
pub trait Reconcile {
    fn reconcile(&mut self, store: &mut GeoPointStore, snapshot: FeedSnapshot) -> Effects;
}

/// Clear everything, then render every point of the new snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct WholesaleReplace;

impl Reconcile for WholesaleReplace {
    fn reconcile(&mut self, store: &mut GeoPointStore, snapshot: FeedSnapshot) -> Effects {
        let mut effects = Effects::with_capacity(snapshot.len() + 1);
        effects.push(Effect::Map(MapOp::ClearPoints));
        effects.extend(
            snapshot
                .iter()
                .cloned()
                .map(|p| Effect::Map(MapOp::AddPoint(p))),
        );
        store.points = snapshot;
        effects
    }
}

/// Remove points missing from the new snapshot and add the new ones,
/// matching points by content.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyedDiff;

impl Reconcile for KeyedDiff {
    fn reconcile(&mut self, store: &mut GeoPointStore, snapshot: FeedSnapshot) -> Effects {
        let old: HashSet<PointKey> = store.points.iter().map(GeoPoint::key).collect();
        let new: HashSet<PointKey> = snapshot.iter().map(GeoPoint::key).collect();

        let mut effects = Effects::new();
        for point in &store.points {
            if !new.contains(&point.key()) {
                effects.push(Effect::Map(MapOp::RemovePoint(point.clone())));
            }
        }
        for point in &snapshot {
            if !old.contains(&point.key()) {
                effects.push(Effect::Map(MapOp::AddPoint(point.clone())));
            }
        }
        store.points = snapshot;
        effects
    }
}

/// Subscription lifecycle plus snapshot reconciliation.
pub struct FeedReconciler<R = WholesaleReplace> {
    store: GeoPointStore,
    strategy: R,
    scope: Option<OwnerId>,
}

impl Default for FeedReconciler<WholesaleReplace> {
    fn default() -> Self {
        Self::new(WholesaleReplace)
    }
}

impl<R: Reconcile> FeedReconciler<R> {
    pub fn new(strategy: R) -> Self {
        Self {
            store: GeoPointStore::new(),
            strategy,
            scope: None,
        }
    }

    pub fn store(&self) -> &GeoPointStore {
        &self.store
    }

    /// Owner scope of the live subscription, if connected.
    pub fn scope(&self) -> Option<OwnerId> {
        self.scope
    }

    pub fn is_connected(&self) -> bool {
        self.scope.is_some()
    }

    /// Start following `owner`'s points. Returns `false` if already
    /// connected (the existing subscription is kept).
    pub fn connect(&mut self, owner: OwnerId) -> bool {
        if let Some(current) = self.scope {
            debug!("feed already connected for {current:?}, ignoring connect for {owner:?}");
            return false;
        }
        info!("feed connected for {owner:?}");
        self.scope = Some(owner);
        true
    }

    /// Stop following. Safe to call when not connected. Rendered points
    /// stay as they are.
    pub fn disconnect(&mut self) {
        if let Some(owner) = self.scope.take() {
            info!("feed disconnected for {owner:?}");
        }
    }

    /// Apply one emission of the subscription.
    pub fn on_emission(&mut self, emission: Result<Vec<FeedRecord>, FeedError>) -> Effects {
        match emission {
            Ok(records) => {
                let snapshot = decode_snapshot(&records);
                debug!(
                    "feed snapshot: {} records, {} points",
                    records.len(),
                    snapshot.len()
                );
                self.strategy.reconcile(&mut self.store, snapshot)
            }
            Err(e) => {
                warn!("feed subscription failed, keeping last snapshot: {e}");
                Effects::new()
            }
        }
    }
}

/// Decode records into points, skipping (and logging) malformed ones.
pub fn decode_snapshot(records: &[FeedRecord]) -> FeedSnapshot {
    records
        .iter()
        .filter_map(|record| match record.decode::<GeoPoint>() {
            Ok(point) => Some(point),
            Err(e) => {
                let err = FeedError::Malformed {
                    key: record.key.clone(),
                    reason: e.to_string(),
                };
                warn!("{err}");
                None
            }
        })
        .collect()
}
