use geo::Geometry;
use serde::Serialize;

use super::{Instruction, TrafficLevel, TravelMode};
use crate::context::{ContextEntryPoint, NearbyRoad};
use crate::types::{LatLng, ParcelSummary, RoadClass};

/// A routing request against the current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: LatLng,
    pub destination_lr_no: String,
    pub mode: TravelMode,
    /// Route to this entry point instead of the best-scoring one.
    pub preferred_entry_label: Option<i32>,
}

impl RouteRequest {
    pub fn new(origin: LatLng, destination_lr_no: impl Into<String>, mode: TravelMode) -> Self {
        Self { origin, destination_lr_no: destination_lr_no.into(), mode, preferred_entry_label: None }
    }

    pub fn with_entry_label(mut self, label: i32) -> Self {
        self.preferred_entry_label = Some(label);
        self
    }
}

/// One leg of a route, either a whole road or a provider step.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSegment {
    pub sequence: usize,
    pub road_gid: Option<u64>,
    pub name: String,
    pub road_type: Option<RoadClass>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub maneuver: Option<String>,
    pub instruction: Option<String>,
    #[serde(serialize_with = "crate::io::geojson::serialize_geometry")]
    pub geometry: Option<Geometry<f64>>,
}

/// Where a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// Stitched from the road layer of the snapshot.
    Local,
    /// Turn-by-turn directions from the external provider.
    Provider,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
    /// Segment lengths plus the final walk.
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub mode: TravelMode,
    pub source: RouteSource,
    pub has_traffic: bool,
    pub traffic_level: TrafficLevel,
    pub entry_point_accessible: bool,
    pub walk_distance_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Destination {
    pub parcel: ParcelSummary,
    pub entry_point: ContextEntryPoint,
    pub access_road: Option<NearbyRoad>,
    pub physical_address: String,
    pub short_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub destination: Destination,
    pub route: Route,
    pub instructions: Vec<Instruction>,
}

impl RouteResult {
    #[inline] pub fn total_distance_m(&self) -> f64 { self.route.total_distance_m }
}
