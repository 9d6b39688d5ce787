//! Core data model for map annotations, routes and feedback.
//!
//! Everything here is plain data: points received from (or written to) the
//! realtime feed, route waypoints and solver answers, feedback and search
//! history records. Records that travel over the feed keep the field names
//! of the stored documents (`lat`, `lng`, `user`, `uuid`, ...).

use crate::id::{OwnerId, SubjectId};
use serde::{Deserialize, Serialize};

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGB color, stored on the wire as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string: `#RGB` or `#RRGGBB`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::new(r, g, b))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB` (uppercase).
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

// ─── Positions ───────────────────────────────────────────────────────────

/// Geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl MapPosition {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Pixel position on the rendered map surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPosition {
    pub x: f32,
    pub y: f32,
}

// ─── Annotation points ───────────────────────────────────────────────────

/// Label stored with every pushed point record.
pub const POINT_RECORD_NAME: &str = "point";

/// A shared, colored annotation point. Immutable once created.
///
/// Written as `{"name", "lat", "lng", "color", "user"}`; `name` is ignored
/// when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PointRecord")]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    pub color: Rgb,
    #[serde(rename = "user")]
    pub owner: OwnerId,
}

#[derive(Serialize)]
struct PointRecord {
    name: &'static str,
    lat: f64,
    lng: f64,
    color: Rgb,
    user: OwnerId,
}

impl From<GeoPoint> for PointRecord {
    fn from(p: GeoPoint) -> Self {
        Self {
            name: POINT_RECORD_NAME,
            lat: p.latitude,
            lng: p.longitude,
            color: p.color,
            user: p.owner,
        }
    }
}

/// Hashable identity of a point's content, used by diffing reconcilers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey {
    lat_bits: u64,
    lng_bits: u64,
    color: Rgb,
    owner: OwnerId,
}

impl GeoPoint {
    pub fn new(at: MapPosition, color: Rgb, owner: OwnerId) -> Self {
        Self {
            latitude: at.latitude,
            longitude: at.longitude,
            color,
            owner,
        }
    }

    pub fn position(&self) -> MapPosition {
        MapPosition::new(self.latitude, self.longitude)
    }

    pub fn key(&self) -> PointKey {
        PointKey {
            lat_bits: self.latitude.to_bits(),
            lng_bits: self.longitude.to_bits(),
            color: self.color,
            owner: self.owner,
        }
    }
}

/// A raw record as delivered by the realtime feed: the store key plus the
/// stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    pub key: String,
    pub value: serde_json::Value,
}

impl FeedRecord {
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Decode the stored document into a typed record.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }
}

/// One full emission of the point subscription, in delivery order.
pub type FeedSnapshot = Vec<GeoPoint>;

// ─── Routes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    Origin,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub role: WaypointRole,
    pub position: MapPosition,
}

/// Path geometry as returned by the route service (one or more parts).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub paths: Vec<Vec<MapPosition>>,
}

impl Polyline {
    pub fn vertex_count(&self) -> usize {
        self.paths.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }
}

/// One turn-by-turn instruction. `length` is in service units (miles).
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionStep {
    pub text: String,
    pub length: f64,
}

impl DirectionStep {
    pub fn new(text: impl Into<String>, length: f64) -> Self {
        Self {
            text: text.into(),
            length,
        }
    }
}

/// A single route alternative.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteResult {
    pub geometry: Polyline,
    pub directions: Vec<DirectionStep>,
}

impl RouteResult {
    /// Sum of step lengths, in service units.
    pub fn total_length(&self) -> f64 {
        self.directions.iter().map(|s| s.length).sum()
    }
}

/// Everything the route service answered, alternatives in response order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteSolution {
    pub routes: Vec<RouteResult>,
}

/// Stroke used to draw a solved route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub color: Rgb,
    pub width: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: Rgb::new(5, 150, 255),
            width: 3.0,
        }
    }
}

// ─── Feedback & history ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub text: String,
    #[serde(rename = "uuid")]
    pub subject: SubjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub searched: String,
    pub user: OwnerId,
}
