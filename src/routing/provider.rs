//! External turn-by-turn directions.

use std::{
    fmt,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use geo::LineString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TravelMode;
use crate::types::LatLng;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("provider found no route")]
    NoRoute,

    #[error("provider not configured")]
    NotConfigured,
}

/// One step of a provider route.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsSegment {
    pub name: String,
    pub geometry: LineString<f64>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Maneuver type, e.g. `depart`, `turn`, `arrive`.
    pub maneuver: String,
    pub modifier: Option<String>,
    pub instruction: Option<String>,
}

/// A route returned by a directions provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Directions {
    pub segments: Vec<DirectionsSegment>,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub congestion: Vec<Congestion>,
}

/// Per-segment congestion sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Congestion {
    Unknown,
    Low,
    Moderate,
    Heavy,
    Severe,
}

impl Congestion {
    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Congestion::Low,
            "moderate" => Congestion::Moderate,
            "heavy" => Congestion::Heavy,
            "severe" => Congestion::Severe,
            _ => Congestion::Unknown,
        }
    }
}

/// Traffic bucket attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLevel {
    Low,
    Moderate,
    Heavy,
    #[default]
    Unknown,
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrafficLevel::Low => "low",
            TrafficLevel::Moderate => "moderate",
            TrafficLevel::Heavy => "heavy",
            TrafficLevel::Unknown => "unknown",
        })
    }
}

/// Bucket congestion samples: heavy if any is severe or more than half are
/// heavy, moderate if more than a third are moderate, otherwise low.
pub fn traffic_level(samples: &[Congestion]) -> TrafficLevel {
    if samples.is_empty() {
        return TrafficLevel::Unknown;
    }
    let count = |level| samples.iter().filter(|&&s| s == level).count();
    let total = samples.len();
    if count(Congestion::Severe) > 0 || count(Congestion::Heavy) * 2 > total {
        TrafficLevel::Heavy
    } else if count(Congestion::Moderate) * 3 > total {
        TrafficLevel::Moderate
    } else {
        TrafficLevel::Low
    }
}

/// A source of turn-by-turn directions, e.g. a hosted routing API.
pub trait DirectionsProvider: Send + Sync {
    fn get_directions(&self, origin: LatLng, destination: LatLng, mode: TravelMode) -> Result<Directions, ProviderError>;
}

/// Call a provider on a worker thread and give up after `timeout`.
///
/// A call that outlives its timeout keeps running on its thread; its result
/// is discarded.
pub fn directions_with_timeout(
    provider: &Arc<dyn DirectionsProvider>,
    origin: LatLng,
    destination: LatLng,
    mode: TravelMode,
    timeout: Duration,
) -> Result<Directions, ProviderError> {
    let (tx, rx) = mpsc::sync_channel(1);
    let provider = Arc::clone(provider);
    thread::Builder::new()
        .name("directions".into())
        .spawn(move || {
            let _ = tx.send(provider.get_directions(origin, destination, mode));
        })
        .map_err(|e| ProviderError::Transport(format!("failed to spawn request thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ProviderError::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ProviderError::Transport("request thread exited".into())),
    }
}
