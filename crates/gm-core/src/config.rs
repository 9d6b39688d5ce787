//! Session configuration.
//!
//! Every field has a default matching the hosted services the app was built
//! against, so a config file only needs to name what differs.

use crate::error::ConfigError;
use crate::model::{MapPosition, PathStyle, Rgb};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration for a map session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Route solver endpoint (`.../NAServer/Route_World`).
    pub route_service_url: String,

    /// API token appended to route requests. Default: none.
    pub api_token: Option<String>,

    /// Collection holding annotation points. Default: **`list1`**.
    pub points_collection: String,

    /// Collection holding feedback entries. Default: **`feedback`**.
    pub feedback_collection: String,

    /// Collection holding search history. Default: **`history`**.
    pub history_collection: String,

    /// Field that scopes point and history records to their owner.
    pub owner_field: String,

    /// Field that keys feedback entries to a feature.
    pub subject_field: String,

    /// Initial camera center.
    pub center: MapPosition,

    pub zoom: u8,

    /// Color used for new points until the user picks one (`#RRGGBB`).
    pub default_color: String,

    /// Stroke for solved routes.
    pub path_style: PathStyle,

    /// Period of the background refresh task, in milliseconds.
    pub refresh_interval_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            route_service_url:
                "https://route-api.arcgis.com/arcgis/rest/services/World/Route/NAServer/Route_World"
                    .to_string(),
            api_token: None,
            points_collection: "list1".to_string(),
            feedback_collection: "feedback".to_string(),
            history_collection: "history".to_string(),
            owner_field: "user".to_string(),
            subject_field: "uuid".to_string(),
            center: MapPosition::new(45.8390366, 25.9727299),
            zoom: 5,
            default_color: "#FFA500".to_string(),
            path_style: PathStyle::default(),
            refresh_interval_ms: 200,
        }
    }
}

impl MapConfig {
    /// Parse a JSON config, filling missing fields from defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for invalid JSON and
    /// [`ConfigError::InvalidColor`] if `default_color` is not a hex color.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_str(text)?;
        config.default_rgb()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn default_rgb(&self) -> Result<Rgb, ConfigError> {
        Rgb::from_hex(&self.default_color)
            .ok_or_else(|| ConfigError::InvalidColor(self.default_color.clone()))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
