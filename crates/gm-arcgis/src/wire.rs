//! Response format of the NAServer `solve` operation (`f=json`).
//!
//! Only the parts the session renders are decoded: route geometry and the
//! per-route direction steps. Vertices come as `[x, y]` = `[lng, lat]`,
//! optionally followed by z/m values.

use gm_core::{DirectionStep, MapPosition, Polyline, RouteError, RouteResult, RouteSolution};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SolveResponse {
    #[serde(default)]
    routes: Option<FeatureSet<RouteAttributes, PathGeometry>>,
    #[serde(default)]
    directions: Vec<DirectionSet>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct FeatureSet<A, G> {
    #[serde(default = "Vec::new")]
    features: Vec<Feature<A, G>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>, G: Deserialize<'de>"))]
struct Feature<A, G> {
    #[serde(default)]
    attributes: Option<A>,
    #[serde(default)]
    geometry: Option<G>,
}

#[derive(Debug, Deserialize)]
struct RouteAttributes {
    #[serde(rename = "ObjectID", default)]
    object_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PathGeometry {
    #[serde(default)]
    paths: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
struct DirectionSet {
    #[serde(rename = "routeId", default)]
    route_id: Option<i64>,
    #[serde(default)]
    features: Vec<Feature<StepAttributes, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct StepAttributes {
    #[serde(default)]
    text: String,
    #[serde(default)]
    length: f64,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

/// Parse a solve response body.
pub fn parse_solution(body: &str) -> Result<RouteSolution, RouteError> {
    let response: SolveResponse =
        serde_json::from_str(body).map_err(|e| RouteError::Malformed(e.to_string()))?;
    into_solution(response)
}

/// Same as [`parse_solution`], for an already decoded JSON value.
pub fn solution_from_value(value: serde_json::Value) -> Result<RouteSolution, RouteError> {
    let response: SolveResponse =
        serde_json::from_value(value).map_err(|e| RouteError::Malformed(e.to_string()))?;
    into_solution(response)
}

fn into_solution(response: SolveResponse) -> Result<RouteSolution, RouteError> {
    if let Some(err) = response.error {
        let mut message = err.message;
        if !err.details.is_empty() {
            message = format!("{message} ({})", err.details.join("; "));
        }
        return Err(RouteError::Service {
            code: err.code,
            message,
        });
    }

    let features = response.routes.map(|set| set.features).unwrap_or_default();
    let mut routes = Vec::with_capacity(features.len());
    for (i, feature) in features.into_iter().enumerate() {
        let object_id = feature.attributes.and_then(|a| a.object_id);
        let geometry = match feature.geometry {
            Some(geometry) => polyline(geometry)?,
            None => Polyline::default(),
        };
        let directions = directions_for(&response.directions, i, object_id);
        routes.push(RouteResult {
            geometry,
            directions,
        });
    }
    Ok(RouteSolution { routes })
}

fn polyline(geometry: PathGeometry) -> Result<Polyline, RouteError> {
    let paths = geometry
        .paths
        .into_iter()
        .map(|path| {
            path.into_iter()
                .map(|vertex| match vertex.as_slice() {
                    [x, y, ..] => Ok(MapPosition::new(*y, *x)),
                    _ => Err(RouteError::Malformed(format!(
                        "vertex with {} coordinates",
                        vertex.len()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polyline { paths })
}

/// Directions of the `index`-th route: matched by `routeId` when both sides
/// carry one, by position otherwise.
fn directions_for(sets: &[DirectionSet], index: usize, object_id: Option<i64>) -> Vec<DirectionStep> {
    let set = object_id
        .and_then(|id| sets.iter().find(|set| set.route_id == Some(id)))
        .or_else(|| sets.get(index));
    let Some(set) = set else {
        return Vec::new();
    };
    set.features
        .iter()
        .filter_map(|feature| feature.attributes.as_ref())
        .map(|a| DirectionStep::new(a.text.clone(), a.length))
        .collect()
}
