use geo::Point;
use serde::Serialize;

/// A vehicular or pedestrian access point. Linked to parcels by proximity only.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPoint {
    pub gid: u64,
    pub label: i32,
    #[serde(skip)]
    pub geometry: Point<f64>,
}
