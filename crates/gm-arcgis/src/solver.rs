use crate::wire::solution_from_value;
use async_trait::async_trait;
use gm_core::{MapConfig, MapPosition, RouteError, RouteSolution};
use gm_session::{RouteParams, RouteSolver};
use log::debug;
use serde_json::Value;

/// Route solver backed by an ArcGIS-style `NAServer` route service.
pub struct ArcgisRouteSolver {
    client: reqwest::Client,
    token: Option<String>,
}

impl ArcgisRouteSolver {
    pub fn new(token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), token)
    }

    pub fn with_client(client: reqwest::Client, token: Option<String>) -> Self {
        Self { client, token }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.api_token.clone())
    }

    /// Form fields of a solve request.
    pub fn form(&self, params: &RouteParams) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("stops", stops_param(&params.stops)),
            ("returnDirections", params.return_directions.to_string()),
            ("f", "json".to_string()),
        ];
        if let Some(token) = &self.token {
            form.push(("token", token.clone()));
        }
        form
    }
}

/// `lng,lat;lng,lat;...`
pub fn stops_param(stops: &[MapPosition]) -> String {
    stops
        .iter()
        .map(|p| format!("{},{}", p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

/// The `solve` operation of a route service layer URL.
pub fn solve_url(service_url: &str) -> String {
    let base = service_url.trim_end_matches('/');
    if base.ends_with("/solve") {
        base.to_string()
    } else {
        format!("{base}/solve")
    }
}

#[async_trait(?Send)]
impl RouteSolver for ArcgisRouteSolver {
    async fn solve(
        &self,
        service_url: &str,
        params: &RouteParams,
    ) -> Result<RouteSolution, RouteError> {
        let url = solve_url(service_url);
        debug!("solving route with {} stops at {url}", params.stops.len());

        let response = self
            .client
            .post(&url)
            .form(&self.form(params))
            .send()
            .await
            .map_err(|e| RouteError::Transport(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::Transport(format!("HTTP error: {status} - {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RouteError::Malformed(format!("response is not JSON: {e}")))?;
        solution_from_value(body)
    }
}
