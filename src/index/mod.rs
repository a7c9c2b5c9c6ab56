//! Per-collection R-tree layers built from a snapshot's source geometries.
//!
//! Every collection is validated in its source coordinate system, then
//! converted to geographic coordinates for proximity queries. Parcels are also
//! kept in Web Mercator for tile envelopes.

use std::fmt;

use geo::{Coord, Geometry, Rect};
use serde::Serialize;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::geom::{self, repair, Crs, Hit, Metric, Repair, SpatialLayer, Transformer};

/// The four geometry collections of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Parcels,
    EntryPoints,
    Roads,
    AdminBlocks,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollectionKind::Parcels => "parcels",
            CollectionKind::EntryPoints => "entry_points",
            CollectionKind::Roads => "roads",
            CollectionKind::AdminBlocks => "admin_blocks",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticAction {
    Repaired,
    Excluded,
}

/// A geometry problem found while building the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub collection: CollectionKind,
    pub gid: u64,
    pub action: DiagnosticAction,
    pub reason: String,
}

impl Diagnostic {
    pub(crate) fn new(collection: CollectionKind, gid: u64, action: DiagnosticAction, reason: impl Into<String>) -> Self {
        let diagnostic = Self { collection, gid, action, reason: reason.into() };
        warn!(collection = %collection, gid, action = ?action, reason = %diagnostic.reason, "geometry diagnostic");
        diagnostic
    }
}

/// Source geometries of one collection, in slot order.
#[derive(Debug, Clone)]
pub struct LayerSource {
    pub crs: Crs,
    pub entries: Vec<(u64, Geometry<f64>)>,
}

struct BuiltLayer {
    geographic: SpatialLayer,
    mercator: Option<SpatialLayer>,
    diagnostics: Vec<Diagnostic>,
}

fn build_layer(kind: CollectionKind, source: LayerSource, with_mercator: bool) -> Result<BuiltLayer> {
    let to_geographic = Transformer::new(&source.crs, &Crs::Wgs84)?;
    let to_mercator = Transformer::new(&source.crs, &Crs::WebMercator)?;
    let total = source.entries.len();

    let mut diagnostics = Vec::new();
    let mut geographic = Vec::with_capacity(total);
    let mut mercator = Vec::with_capacity(if with_mercator { total } else { 0 });

    for (gid, geometry) in source.entries {
        let valid = match repair(geometry) {
            Repair::Valid(geometry) => Some(geometry),
            Repair::Repaired(geometry, reason) => {
                diagnostics.push(Diagnostic::new(kind, gid, DiagnosticAction::Repaired, reason));
                Some(geometry)
            }
            Repair::Excluded(reason) => {
                diagnostics.push(Diagnostic::new(kind, gid, DiagnosticAction::Excluded, reason));
                None
            }
        };

        let converted = valid.map(|geometry| -> Result<_> {
            let projected = if with_mercator { Some(to_mercator.geometry(&geometry)?) } else { None };
            Ok((to_geographic.geometry(&geometry)?, projected))
        });
        let (geo, merc) = match converted.transpose() {
            Ok(Some((geo, merc))) => (Some(geo), merc),
            Ok(None) => (None, None),
            Err(e) => {
                diagnostics.push(Diagnostic::new(kind, gid, DiagnosticAction::Excluded, e.to_string()));
                (None, None)
            }
        };
        geographic.push((gid, geo));
        if with_mercator {
            mercator.push((gid, merc));
        }
    }

    let geographic = SpatialLayer::new(Metric::Geodesic, geographic);
    if total > 0 && geographic.indexed() == 0 {
        return Err(EngineError::IndexBuild(format!("no usable geometry in collection {kind} ({total} records)")));
    }
    let mercator = with_mercator.then(|| SpatialLayer::new(Metric::Planar, mercator));
    Ok(BuiltLayer { geographic, mercator, diagnostics })
}

/// Spatial layers of one snapshot. Slots line up with the snapshot's record vectors.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    parcels: SpatialLayer,
    parcel_tiles: SpatialLayer,
    entry_points: SpatialLayer,
    roads: SpatialLayer,
    admin_blocks: SpatialLayer,
}

impl SpatialIndex {
    /// Build all four layers, in parallel. Returns the index and every
    /// diagnostic recorded along the way.
    pub fn build(
        parcels: LayerSource,
        entry_points: LayerSource,
        roads: LayerSource,
        admin_blocks: LayerSource,
    ) -> Result<(Self, Vec<Diagnostic>)> {
        let ((parcels, entry_points), (roads, admin_blocks)) = rayon::join(
            || rayon::join(
                || build_layer(CollectionKind::Parcels, parcels, true),
                || build_layer(CollectionKind::EntryPoints, entry_points, false),
            ),
            || rayon::join(
                || build_layer(CollectionKind::Roads, roads, false),
                || build_layer(CollectionKind::AdminBlocks, admin_blocks, false),
            ),
        );
        let (parcels, entry_points, roads, admin_blocks) = (parcels?, entry_points?, roads?, admin_blocks?);

        let diagnostics = [&parcels, &entry_points, &roads, &admin_blocks].into_iter()
            .flat_map(|layer| layer.diagnostics.iter().cloned())
            .collect();
        let parcel_tiles = parcels.mercator
            .ok_or_else(|| EngineError::IndexBuild("parcel tile layer missing".into()))?;

        Ok((
            Self {
                parcels: parcels.geographic,
                parcel_tiles,
                entry_points: entry_points.geographic,
                roads: roads.geographic,
                admin_blocks: admin_blocks.geographic,
            },
            diagnostics,
        ))
    }

    /// Geographic layer of a collection.
    pub fn layer(&self, kind: CollectionKind) -> &SpatialLayer {
        match kind {
            CollectionKind::Parcels => &self.parcels,
            CollectionKind::EntryPoints => &self.entry_points,
            CollectionKind::Roads => &self.roads,
            CollectionKind::AdminBlocks => &self.admin_blocks,
        }
    }

    /// Parcels in Web Mercator meters.
    #[inline]
    pub fn parcel_tiles(&self) -> &SpatialLayer { &self.parcel_tiles }

    /// Bounding-box candidates intersecting a lon/lat rectangle.
    pub fn query_bbox(&self, kind: CollectionKind, envelope: Rect<f64>) -> Vec<usize> {
        self.layer(kind).query_rect(envelope)
    }

    /// The `k` nearest entries passing `filter`, ordered by (distance, gid).
    pub fn nearest<F>(&self, kind: CollectionKind, geometry: &Geometry<f64>, k: usize, max_distance: Option<f64>, filter: F) -> Vec<Hit>
    where
        F: Fn(usize) -> bool,
    {
        self.layer(kind).nearest(geometry, k, max_distance, filter)
    }

    /// All entries within `max_distance` meters, ordered by (distance, gid).
    pub fn within_distance<F>(&self, kind: CollectionKind, geometry: &Geometry<f64>, max_distance: f64, filter: F) -> Vec<Hit>
    where
        F: Fn(usize) -> bool,
    {
        self.layer(kind).within_distance(geometry, max_distance, filter)
    }

    /// Lowest-gid entry whose geometry contains or touches a lon/lat position.
    pub fn containing(&self, kind: CollectionKind, coord: Coord<f64>) -> Option<usize> {
        self.layer(kind).containing(coord)
    }

    /// Entries whose geometry intersects `geometry`, ordered by gid.
    pub fn intersects(&self, kind: CollectionKind, geometry: &Geometry<f64>) -> Vec<usize> {
        self.layer(kind).intersecting(geometry)
    }

    /// Geodesic distance in meters between two lon/lat geometries.
    pub fn distance(&self, a: &Geometry<f64>, b: &Geometry<f64>) -> Option<f64> {
        geom::distance(Metric::Geodesic, a, b)
    }
}
