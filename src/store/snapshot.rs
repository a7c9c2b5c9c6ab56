use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use geo::{Centroid, Geometry};

use super::{Collection, Collections};
use crate::error::Result;
use crate::geom::mercator;
use crate::index::{CollectionKind, Diagnostic, DiagnosticAction, LayerSource, SpatialIndex};
use crate::types::{AdminBlock, EntryPoint, LatLng, Parcel, ParcelSummary, Road};

/// An immutable, fully indexed set of the four collections.
///
/// Record vectors and index layers share slot numbers: `parcels()[slot]` is
/// the record for slot `slot` of the parcel layers.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    parcels: Vec<Arc<Parcel>>,
    entry_points: Vec<Arc<EntryPoint>>,
    roads: Vec<Arc<Road>>,
    admin_blocks: Vec<Arc<AdminBlock>>,
    centroids: Vec<Option<LatLng>>,
    by_lr_no: AHashMap<String, usize>,
    by_gid: AHashMap<u64, usize>,
    index: SpatialIndex,
    diagnostics: Vec<Diagnostic>,
}

/// Drop parcels whose `lr_no` or `gid` was already seen, keeping the first.
fn dedup_parcels(parcels: Vec<Parcel>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Parcel> {
    let mut seen_codes = AHashSet::with_capacity(parcels.len());
    let mut seen_gids = AHashSet::with_capacity(parcels.len());
    parcels.into_iter()
        .filter(|parcel| {
            let reason = if !seen_gids.insert(parcel.gid) {
                "duplicate gid"
            } else if !seen_codes.insert(parcel.lr_no.clone()) {
                "duplicate lr_no"
            } else {
                return true;
            };
            diagnostics.push(Diagnostic::new(CollectionKind::Parcels, parcel.gid, DiagnosticAction::Excluded, reason));
            false
        })
        .collect()
}

fn layer_source<T>(collection: &Collection<T>, entry: impl Fn(&T) -> (u64, Geometry<f64>)) -> LayerSource {
    LayerSource { crs: collection.crs.clone(), entries: collection.records.iter().map(entry).collect() }
}

impl Snapshot {
    /// Validate, convert and index a set of collections. The snapshot gets
    /// its version when a store installs it.
    pub fn build(collections: Collections) -> Result<Self> {
        let Collections { parcels, entry_points, roads, admin_blocks } = collections;

        let mut diagnostics = Vec::new();
        let parcels = Collection::new(parcels.crs, dedup_parcels(parcels.records, &mut diagnostics));

        let (index, index_diagnostics) = SpatialIndex::build(
            layer_source(&parcels, |p| (p.gid, p.geometry.clone().into())),
            layer_source(&entry_points, |e| (e.gid, e.geometry.into())),
            layer_source(&roads, |r| (r.gid, r.geometry.clone().into())),
            layer_source(&admin_blocks, |b| (b.gid, b.geometry.clone().into())),
        )?;
        diagnostics.extend(index_diagnostics);

        // Centroids are taken in Web Mercator, as the parcel data is stored.
        let tiles = index.parcel_tiles();
        let centroids = (0..parcels.len())
            .map(|slot| {
                let point = tiles.shape(slot)?.centroid()?;
                Some(LatLng::new(mercator::y_to_lat(point.y()), mercator::x_to_lon(point.x())))
            })
            .collect();

        let by_lr_no = parcels.records.iter().enumerate().map(|(slot, p)| (p.lr_no.clone(), slot)).collect();
        let by_gid = parcels.records.iter().enumerate().map(|(slot, p)| (p.gid, slot)).collect();

        Ok(Self {
            version: 0,
            parcels: parcels.records.into_iter().map(Arc::new).collect(),
            entry_points: entry_points.records.into_iter().map(Arc::new).collect(),
            roads: roads.records.into_iter().map(Arc::new).collect(),
            admin_blocks: admin_blocks.records.into_iter().map(Arc::new).collect(),
            centroids,
            by_lr_no,
            by_gid,
            index,
            diagnostics,
        })
    }

    /// A snapshot with no data, installed before the first load.
    pub fn empty() -> Result<Self> { Self::build(Collections::default()) }

    #[inline] pub fn version(&self) -> u64 { self.version }

    pub(super) fn set_version(&mut self, version: u64) { self.version = version; }

    #[inline] pub fn index(&self) -> &SpatialIndex { &self.index }

    /// Geometry problems recorded while building this snapshot.
    #[inline] pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

    #[inline] pub fn parcels(&self) -> &[Arc<Parcel>] { &self.parcels }

    #[inline] pub fn entry_points(&self) -> &[Arc<EntryPoint>] { &self.entry_points }

    #[inline] pub fn roads(&self) -> &[Arc<Road>] { &self.roads }

    #[inline] pub fn admin_blocks(&self) -> &[Arc<AdminBlock>] { &self.admin_blocks }

    #[inline] pub fn parcel(&self, slot: usize) -> &Arc<Parcel> { &self.parcels[slot] }

    #[inline] pub fn entry_point(&self, slot: usize) -> &Arc<EntryPoint> { &self.entry_points[slot] }

    #[inline] pub fn road(&self, slot: usize) -> &Arc<Road> { &self.roads[slot] }

    #[inline] pub fn admin_block(&self, slot: usize) -> &Arc<AdminBlock> { &self.admin_blocks[slot] }

    /// Centroid of a parcel, if its geometry was indexed.
    #[inline] pub fn centroid(&self, slot: usize) -> Option<LatLng> { self.centroids[slot] }

    /// Entry point position in WGS84, if its geometry was indexed.
    pub fn entry_point_position(&self, slot: usize) -> Option<LatLng> {
        match self.index.layer(CollectionKind::EntryPoints).shape(slot)? {
            Geometry::Point(point) => Some((*point).into()),
            _ => None,
        }
    }

    /// Parcel slot by exact registration code.
    pub fn slot_by_lr_no(&self, lr_no: &str) -> Option<usize> { self.by_lr_no.get(lr_no).copied() }

    /// Parcel slot by identifier.
    pub fn slot_by_gid(&self, gid: u64) -> Option<usize> { self.by_gid.get(&gid).copied() }

    /// Listing view of a parcel.
    pub fn summary(&self, slot: usize) -> ParcelSummary {
        let parcel = &self.parcels[slot];
        ParcelSummary {
            gid: parcel.gid,
            lr_no: parcel.lr_no.clone(),
            fr_no: parcel.fr_no.clone(),
            area: parcel.area,
            entity: parcel.entity.clone(),
            centroid: self.centroids[slot],
        }
    }
}
