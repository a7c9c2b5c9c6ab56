//! Mapbox Directions API v5 client.

use std::time::Duration;

use geo::LineString;
use reqwest::{blocking::Client, redirect::Policy, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::provider::{Congestion, Directions, DirectionsProvider, DirectionsSegment, ProviderError};
use super::TravelMode;
use crate::types::LatLng;

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/directions/v5/mapbox";

pub struct MapboxDirections {
    client: Client,
    token: String,
    base_url: String,
}

impl MapboxDirections {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("parcelnav/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, token: token.into(), base_url: DEFAULT_BASE_URL.into() })
    }

    /// Build a client from `MAPBOX_ACCESS_TOKEN`; `NotConfigured` if unset or blank.
    pub fn from_env(timeout: Duration) -> Result<Self, ProviderError> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Self::new(token.trim(), timeout),
            _ => Err(ProviderError::NotConfigured),
        }
    }

    /// Point the client at another Directions-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl DirectionsProvider for MapboxDirections {
    fn get_directions(&self, origin: LatLng, destination: LatLng, mode: TravelMode) -> Result<Directions, ProviderError> {
        let url = format!(
            "{}/{}/{},{};{},{}",
            self.base_url.trim_end_matches('/'),
            mode.profile(),
            origin.lng, origin.lat,
            destination.lng, destination.lat,
        );
        debug!(%url, "requesting directions");

        let response = self.client.get(&url)
            .query(&[
                ("access_token", self.token.as_str()),
                ("geometries", "geojson"),
                ("steps", "true"),
                ("overview", "full"),
                ("annotations", "distance,duration,congestion"),
                ("language", "en"),
            ])
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            status => return Err(ProviderError::Status(status.as_u16())),
        }
        let body = response.bytes().map_err(|e| ProviderError::Transport(e.to_string()))?;
        parse_response(&body)
    }
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Deserialize)]
struct Route {
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Deserialize)]
struct Leg {
    #[serde(default)]
    steps: Vec<Step>,
    #[serde(default)]
    annotation: Option<Annotation>,
}

#[derive(Deserialize)]
struct Annotation {
    #[serde(default)]
    congestion: Vec<String>,
}

#[derive(Deserialize)]
struct Step {
    distance: f64,
    duration: f64,
    #[serde(default)]
    name: String,
    maneuver: Maneuver,
    #[serde(default)]
    geometry: Option<StepGeometry>,
}

#[derive(Deserialize)]
struct Maneuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    #[serde(default)]
    instruction: Option<String>,
}

#[derive(Deserialize)]
struct StepGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Map a Directions v5 response body onto [`Directions`], using the first route.
pub(crate) fn parse_response(body: &[u8]) -> Result<Directions, ProviderError> {
    let response: Response = serde_json::from_slice(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    if let Some(code) = response.code.as_deref().filter(|code| *code != "Ok") {
        return Err(if code == "NoRoute" { ProviderError::NoRoute } else { ProviderError::Malformed(format!("response code {code}")) });
    }
    let route = response.routes.into_iter().next().ok_or(ProviderError::NoRoute)?;

    let mut segments = Vec::new();
    let mut congestion = Vec::new();
    for leg in route.legs {
        if let Some(annotation) = leg.annotation {
            congestion.extend(annotation.congestion.iter().map(|s| Congestion::parse(s)));
        }
        segments.extend(leg.steps.into_iter().map(|step| DirectionsSegment {
            name: step.name,
            geometry: step.geometry
                .map(|g| g.coordinates.into_iter().map(|[x, y]| (x, y)).collect())
                .unwrap_or_else(|| LineString::new(vec![])),
            distance_m: step.distance,
            duration_s: step.duration,
            maneuver: step.maneuver.kind,
            modifier: step.maneuver.modifier,
            instruction: step.maneuver.instruction,
        }));
    }

    Ok(Directions { segments, total_distance_m: route.distance, total_duration_s: route.duration, congestion })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 812.4,
            "duration": 96.2,
            "legs": [{
                "annotation": { "congestion": ["low", "moderate", "moderate", "unknown"] },
                "steps": [
                    { "distance": 500.0, "duration": 60.0, "name": "Ngong Road",
                      "maneuver": { "type": "depart", "instruction": "Head east on Ngong Road" },
                      "geometry": { "coordinates": [[36.78, -1.30], [36.785, -1.30]] } },
                    { "distance": 312.4, "duration": 36.2, "name": "Argwings Kodhek Road",
                      "maneuver": { "type": "turn", "modifier": "left" },
                      "geometry": { "coordinates": [[36.785, -1.30], [36.785, -1.297]] } },
                    { "distance": 0.0, "duration": 0.0, "name": "",
                      "maneuver": { "type": "arrive" } }
                ]
            }]
        }]
    }"#;

    #[test]
    fn parses_steps_and_congestion() {
        let directions = parse_response(BODY.as_bytes()).unwrap();
        assert_eq!(directions.segments.len(), 3);
        assert_eq!(directions.segments[1].maneuver, "turn");
        assert_eq!(directions.segments[1].modifier.as_deref(), Some("left"));
        assert_eq!(directions.segments[0].geometry.0.len(), 2);
        assert_eq!(directions.total_distance_m, 812.4);
        assert_eq!(directions.congestion, vec![Congestion::Low, Congestion::Moderate, Congestion::Moderate, Congestion::Unknown]);
    }

    #[test]
    fn no_route_code_is_reported() {
        let result = parse_response(br#"{"code":"NoRoute","routes":[]}"#);
        assert_eq!(result, Err(ProviderError::NoRoute));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_response(b"<html>"), Err(ProviderError::Malformed(_))));
    }
}
