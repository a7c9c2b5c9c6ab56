mod resolver;

use std::sync::Arc;

use geo::Geometry;
use serde::Serialize;
use smallvec::SmallVec;

pub use resolver::ContextResolver;

use crate::types::{AdminBlock, LatLng, Parcel, RoadClass};

/// A named road near an entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyRoad {
    pub gid: u64,
    pub name: String,
    pub class: RoadClass,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub distance_m: f64,
    #[serde(skip)]
    pub slot: usize,
}

/// An entry point near a parcel, with the named roads around it.
#[derive(Debug, Clone, Serialize)]
pub struct ContextEntryPoint {
    pub gid: u64,
    pub label: i32,
    pub coordinates: LatLng,
    pub distance_to_parcel_m: f64,
    pub nearest_roads: SmallVec<[NearbyRoad; 3]>,
    #[serde(skip)]
    pub slot: usize,
}

/// How the administrative block of a parcel was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum BlockRelation {
    Intersects,
    Nearest { distance_m: f64 },
    /// Nothing to measure from; the lowest-gid block stands in.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockMatch {
    pub block: Arc<AdminBlock>,
    #[serde(flatten)]
    pub relation: BlockRelation,
}

/// Spatial context of one parcel, resolved against a single snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ParcelContext {
    pub parcel: Arc<Parcel>,
    pub centroid: Option<LatLng>,
    /// Parcel outline in WGS84, if the geometry was indexed.
    #[serde(serialize_with = "crate::io::geojson::serialize_geometry")]
    pub geometry: Option<Geometry<f64>>,
    pub administrative_block: Option<BlockMatch>,
    /// Ordered by distance to the parcel, then gid.
    pub entry_points: Vec<ContextEntryPoint>,
    #[serde(skip)]
    pub slot: usize,
}

impl ParcelContext {
    /// Entry point with the given label, if it is part of this context.
    pub fn entry_point(&self, label: i32) -> Option<&ContextEntryPoint> {
        self.entry_points.iter().find(|ep| ep.label == label)
    }

    pub fn block(&self) -> Option<&AdminBlock> {
        self.administrative_block.as_ref().map(|m| m.block.as_ref())
    }
}
