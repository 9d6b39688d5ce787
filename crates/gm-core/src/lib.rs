pub mod config;
pub mod error;
pub mod id;
pub mod layers;
pub mod model;
pub mod panel;
pub mod units;

pub use config::MapConfig;
pub use error::{ConfigError, FeedError, LookupError, RouteError};
pub use id::{OwnerId, SubjectId};
pub use layers::{FeedbackTarget, HitFeature, KnownLayer, LayerKind, resolve_target};
pub use model::*;
pub use panel::{PanelAction, PanelAnchor, PanelRow, UiPanel};
pub use units::{KM_PER_MILE, miles_to_km};
