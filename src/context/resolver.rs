use std::sync::Arc;

use geo::Geometry;
use tracing::debug;

use super::{BlockMatch, BlockRelation, ContextEntryPoint, NearbyRoad, ParcelContext};
use crate::config::ContextConfig;
use crate::error::{EngineError, Result};
use crate::geom::Hit;
use crate::index::CollectionKind;
use crate::store::Snapshot;
use crate::types::{LatLng, Parcel};

/// Composes index queries into parcel contexts. Borrowed per request.
#[derive(Debug, Clone, Copy)]
pub struct ContextResolver<'a> {
    snapshot: &'a Snapshot,
    config: &'a ContextConfig,
}

impl<'a> ContextResolver<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a ContextConfig) -> Self {
        Self { snapshot, config }
    }

    #[inline] pub fn snapshot(&self) -> &'a Snapshot { self.snapshot }

    /// Parcel slot at a position, accepting parcels within `tolerance_m` of it.
    fn locate(&self, at: LatLng, tolerance_m: f64) -> Option<usize> {
        let index = self.snapshot.index();
        index.containing(CollectionKind::Parcels, at.to_coord()).or_else(|| {
            if tolerance_m <= 0.0 {
                return None;
            }
            index.nearest(CollectionKind::Parcels, &Geometry::Point(at.to_point()), 1, Some(tolerance_m), |_| true)
                .first()
                .map(|hit| hit.slot)
        })
    }

    /// Context of the parcel at a position, with the configured boundary slack.
    pub fn resolve_by_point(&self, at: LatLng) -> Result<ParcelContext> {
        let at = at.validate()?;
        let slot = self.locate(at, self.config.point_tolerance_m)
            .ok_or_else(|| EngineError::NotFound(format!("no parcel at ({}, {})", at.lat, at.lng)))?;
        self.context_for(slot)
    }

    /// Parcel strictly containing a position (boundary included, no slack).
    pub fn find_parcel_at(&self, at: LatLng) -> Result<Arc<Parcel>> {
        let at = at.validate()?;
        let slot = self.locate(at, 0.0)
            .ok_or_else(|| EngineError::NotFound(format!("no parcel at ({}, {})", at.lat, at.lng)))?;
        Ok(Arc::clone(self.snapshot.parcel(slot)))
    }

    pub fn resolve_by_lr_no(&self, lr_no: &str) -> Result<ParcelContext> {
        let lr_no = lr_no.trim();
        if lr_no.is_empty() {
            return Err(EngineError::InvalidInput("registration code must not be empty".into()));
        }
        let slot = self.snapshot.slot_by_lr_no(lr_no)
            .ok_or_else(|| EngineError::NotFound(format!("parcel {lr_no}")))?;
        self.context_for(slot)
    }

    pub fn resolve_by_gid(&self, gid: u64) -> Result<ParcelContext> {
        let slot = self.snapshot.slot_by_gid(gid)
            .ok_or_else(|| EngineError::NotFound(format!("parcel gid {gid}")))?;
        self.context_for(slot)
    }

    /// Named roads near a geometry, ordered by (distance, gid).
    pub fn named_roads_near(&self, geometry: &Geometry<f64>, k: usize, max_distance: Option<f64>) -> Vec<NearbyRoad> {
        let snapshot = self.snapshot;
        snapshot.index()
            .nearest(CollectionKind::Roads, geometry, k, max_distance, |slot| snapshot.road(slot).named().is_some())
            .into_iter()
            .map(|hit| self.nearby_road(hit))
            .collect()
    }

    /// Roads of any kind near a geometry, ordered by (distance, gid).
    pub fn roads_near(&self, geometry: &Geometry<f64>, k: usize, max_distance: Option<f64>) -> Vec<NearbyRoad> {
        self.snapshot.index()
            .nearest(CollectionKind::Roads, geometry, k, max_distance, |_| true)
            .into_iter()
            .map(|hit| self.nearby_road(hit))
            .collect()
    }

    fn nearby_road(&self, hit: Hit) -> NearbyRoad {
        let road = self.snapshot.road(hit.slot);
        NearbyRoad {
            gid: road.gid,
            name: road.named().unwrap_or_default().to_string(),
            class: road.class.clone(),
            reference: road.reference.clone(),
            distance_m: hit.distance,
            slot: hit.slot,
        }
    }

    /// Lowest-gid administrative block intersecting a geometry.
    pub fn intersecting_block(&self, geometry: &Geometry<f64>) -> Option<usize> {
        self.snapshot.index().intersects(CollectionKind::AdminBlocks, geometry).into_iter().next()
    }

    /// Administrative block nearest to a geometry.
    pub fn nearest_block(&self, geometry: &Geometry<f64>) -> Option<Hit> {
        self.snapshot.index().nearest(CollectionKind::AdminBlocks, geometry, 1, None, |_| true).into_iter().next()
    }

    fn block_for(&self, geometry: Option<&Geometry<f64>>, centroid: Option<LatLng>) -> Option<BlockMatch> {
        let snapshot = self.snapshot;
        let matched = geometry.and_then(|geometry| {
            if let Some(slot) = self.intersecting_block(geometry) {
                return Some((slot, BlockRelation::Intersects));
            }
            let probe = centroid.map(|c| Geometry::Point(c.to_point())).unwrap_or_else(|| geometry.clone());
            self.nearest_block(&probe).map(|hit| (hit.slot, BlockRelation::Nearest { distance_m: hit.distance }))
        });
        let (slot, relation) = matched.or_else(|| {
            let blocks = snapshot.admin_blocks();
            (0..blocks.len()).min_by_key(|&slot| blocks[slot].gid).map(|slot| (slot, BlockRelation::Fallback))
        })?;
        Some(BlockMatch { block: Arc::clone(snapshot.admin_block(slot)), relation })
    }

    /// Entry points within the configured radius of a parcel geometry, each
    /// with its nearest named roads.
    fn entry_points_near(&self, geometry: &Geometry<f64>) -> Vec<ContextEntryPoint> {
        let snapshot = self.snapshot;
        snapshot.index()
            .within_distance(CollectionKind::EntryPoints, geometry, self.config.entry_point_radius_m, |_| true)
            .into_iter()
            .filter_map(|hit| {
                let entry = snapshot.entry_point(hit.slot);
                let coordinates = snapshot.entry_point_position(hit.slot)?;
                let point = Geometry::Point(coordinates.to_point());
                let roads = self.named_roads_near(&point, self.config.roads_per_entry_point, Some(self.config.road_radius_m));
                Some(ContextEntryPoint {
                    gid: entry.gid,
                    label: entry.label,
                    coordinates,
                    distance_to_parcel_m: hit.distance,
                    nearest_roads: roads.into_iter().collect(),
                    slot: hit.slot,
                })
            })
            .collect()
    }

    /// Full context of the parcel in `slot`.
    pub fn context_for(&self, slot: usize) -> Result<ParcelContext> {
        let snapshot = self.snapshot;
        let parcel = Arc::clone(snapshot.parcel(slot));
        let centroid = snapshot.centroid(slot);
        let geometry = snapshot.index().layer(CollectionKind::Parcels).shape(slot).cloned();

        let administrative_block = self.block_for(geometry.as_ref(), centroid);
        let entry_points = geometry.as_ref().map(|g| self.entry_points_near(g)).unwrap_or_default();
        debug!(
            lr_no = %parcel.lr_no,
            entry_points = entry_points.len(),
            block = administrative_block.as_ref().map(|m| m.block.gid),
            "resolved parcel context"
        );

        Ok(ParcelContext { parcel, centroid, geometry, administrative_block, entry_points, slot })
    }
}
