pub mod collab;
pub mod controller;
pub mod effect;
pub mod feed;
pub mod feedback;
pub mod history;
pub mod input;
pub mod route;
pub mod session;
pub mod ticker;

pub use collab::{MapSurface, PanelHost, RealtimeFeed, RouteParams, RouteSolver, SnapshotStream};
pub use controller::{InteractionController, InteractionMode};
pub use effect::{Effect, Effects, LookupPurpose, MapOp, Outcome, PanelOp, Request};
pub use feed::{FeedReconciler, GeoPointStore, KeyedDiff, Reconcile, WholesaleReplace};
pub use input::{ClickEvent, InputEvent};
pub use route::{RoutePipeline, RouteState};
pub use session::{Collaborators, Session, UiEvent};
pub use ticker::PeriodicTask;
