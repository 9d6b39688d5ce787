//! Feature layers that carry feedback, and how to read a subject id out of
//! a hit feature.

use crate::error::LookupError;
use crate::id::SubjectId;
use serde_json::{Map, Value};

/// Kind of map layer a hit came from. Only feature layers carry
/// attributes worth inspecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Feature,
    Graphics,
    Other,
}

/// One entry of a hit-test answer.
#[derive(Debug, Clone, PartialEq)]
pub struct HitFeature {
    pub layer_kind: LayerKind,
    pub layer_title: String,
    pub attributes: Map<String, Value>,
}

impl HitFeature {
    pub fn feature(layer_title: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            layer_kind: LayerKind::Feature,
            layer_title: layer_title.into(),
            attributes,
        }
    }

    /// Display name of the feature (`name` attribute), empty if absent.
    pub fn display_name(&self) -> String {
        self.attributes
            .get("name")
            .map(value_to_string)
            .unwrap_or_default()
    }
}

/// The closed set of layers that support feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownLayer {
    NaturalAttractions,
    Tourism,
}

impl KnownLayer {
    pub const ALL: [KnownLayer; 2] = [KnownLayer::NaturalAttractions, KnownLayer::Tourism];

    pub fn title(&self) -> &'static str {
        match self {
            KnownLayer::NaturalAttractions => "Atractii naturale points",
            KnownLayer::Tourism => "Turism points",
        }
    }

    /// Attribute holding the feature's stable identity on this layer.
    pub fn subject_key(&self) -> &'static str {
        match self {
            KnownLayer::NaturalAttractions => "place_id",
            KnownLayer::Tourism => "F_id",
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.title() == title)
    }
}

/// A feature resolved to the subject its feedback is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackTarget {
    pub layer: KnownLayer,
    pub subject: SubjectId,
    pub display_name: String,
}

/// Resolve a hit feature into a feedback target.
pub fn resolve_target(hit: &HitFeature) -> Result<FeedbackTarget, LookupError> {
    let layer = KnownLayer::from_title(&hit.layer_title)
        .ok_or_else(|| LookupError::UnknownLayer(hit.layer_title.clone()))?;
    let key = layer.subject_key();
    let subject = hit
        .attributes
        .get(key)
        .filter(|v| !v.is_null())
        .map(value_to_string)
        .ok_or_else(|| LookupError::MissingSubject {
            layer: hit.layer_title.clone(),
            key,
        })?;
    Ok(FeedbackTarget {
        layer,
        subject: SubjectId::intern(&subject),
        display_name: hit.display_name(),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn natural_layer_uses_place_id() {
        let hit = HitFeature::feature(
            "Atractii naturale points",
            attrs(json!({"place_id": "ChIJabc", "name": "Cheile Turzii"})),
        );
        let target = resolve_target(&hit).unwrap();
        assert_eq!(target.layer, KnownLayer::NaturalAttractions);
        assert_eq!(target.subject.as_str(), "ChIJabc");
        assert_eq!(target.display_name, "Cheile Turzii");
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let hit = HitFeature::feature("Turism points", attrs(json!({"F_id": 1234})));
        let target = resolve_target(&hit).unwrap();
        assert_eq!(target.subject.as_str(), "1234");
        assert_eq!(target.display_name, "");
    }

    #[test]
    fn unknown_layer_is_rejected() {
        let hit = HitFeature::feature("Spitale", attrs(json!({"F_id": 1})));
        assert_eq!(
            resolve_target(&hit),
            Err(LookupError::UnknownLayer("Spitale".into()))
        );
    }

    #[test]
    fn missing_key_is_rejected() {
        let hit = HitFeature::feature("Turism points", attrs(json!({"place_id": "x"})));
        assert!(matches!(
            resolve_target(&hit),
            Err(LookupError::MissingSubject { key: "F_id", .. })
        ));
    }
}
