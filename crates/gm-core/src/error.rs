//! Error taxonomy shared by the collaborators and the session.
//!
//! None of these are fatal: the session logs them at the async boundary and
//! leaves the UI in its last consistent state.

/// Failures talking to the realtime data store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("feed transport failed: {0}")]
    Transport(String),
    #[error("feed rejected the request: {0}")]
    Rejected(String),
    #[error("malformed feed record `{key}`: {reason}")]
    Malformed { key: String, reason: String },
}

/// Failures solving a route.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("route service unreachable: {0}")]
    Transport(String),
    #[error("route service error {code}: {message}")]
    Service { code: i64, message: String },
    #[error("malformed route response: {0}")]
    Malformed(String),
}

/// Failures resolving a clicked feature into a feedback subject.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("hit test failed: {0}")]
    HitTest(String),
    #[error("feature belongs to unknown layer `{0}`")]
    UnknownLayer(String),
    #[error("feature on layer `{layer}` has no `{key}` attribute")]
    MissingSubject { layer: String, key: &'static str },
}

/// Failures loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid color `{0}` (expected #RRGGBB)")]
    InvalidColor(String),
}
