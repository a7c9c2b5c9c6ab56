//! Entry-point scoring.
//!
//! Each candidate entry point gets a score `d * w_d - q * w_q`, where `d` is
//! the straight-line distance from the origin and `q` the quality of the best
//! road next to it. Lower scores win.

use std::cmp::Ordering;

use geo::{Geometry, Point};

use super::TravelMode;
use crate::config::RoutingConfig;
use crate::context::ParcelContext;
use crate::error::{EngineError, Result};
use crate::geom::haversine_m;
use crate::index::CollectionKind;
use crate::store::Snapshot;
use crate::types::LatLng;

/// Score of one entry point of a parcel context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryAssessment {
    /// Position in `ParcelContext::entry_points`.
    pub index: usize,
    pub gid: u64,
    pub label: i32,
    pub distance_m: f64,
    pub quality: f64,
    /// False when roads are nearby but none can be used in the travel mode.
    pub accessible: bool,
    pub score: f64,
}

/// Quality of the roads around `at` and whether any of them is usable.
///
/// With no road in range the quality is zero and the entry point counts as
/// accessible: there is nothing to rule it out.
pub fn access_quality(snapshot: &Snapshot, config: &RoutingConfig, at: Point<f64>, mode: TravelMode) -> (f64, bool) {
    let hits = snapshot.index()
        .within_distance(CollectionKind::Roads, &Geometry::Point(at), config.access_quality_radius_m, |_| true);
    if hits.is_empty() {
        return (0.0, true);
    }

    let mut accessible = false;
    let quality = hits.iter()
        .map(|hit| {
            let class = &snapshot.road(hit.slot).class;
            if mode.can_use(class) {
                accessible = true;
                class.base_quality() - (config.penalty_per_meter * hit.distance).min(config.max_distance_penalty)
            } else {
                config.inaccessible_quality
            }
        })
        .fold(f64::NEG_INFINITY, f64::max);
    (quality, accessible)
}

/// Score every entry point of `context` for a trip starting at `origin`.
pub fn assess_entries(
    snapshot: &Snapshot,
    config: &RoutingConfig,
    context: &ParcelContext,
    origin: LatLng,
    mode: TravelMode,
) -> Vec<EntryAssessment> {
    context.entry_points.iter()
        .enumerate()
        .map(|(index, entry)| {
            let distance_m = haversine_m(origin.to_coord(), entry.coordinates.to_coord());
            let (quality, accessible) = access_quality(snapshot, config, entry.coordinates.to_point(), mode);
            EntryAssessment {
                index,
                gid: entry.gid,
                label: entry.label,
                distance_m,
                quality,
                accessible,
                score: distance_m * config.distance_weight - quality * config.quality_weight,
            }
        })
        .collect()
}

fn by_score(a: &EntryAssessment, b: &EntryAssessment) -> Ordering {
    a.score.total_cmp(&b.score)
        .then(a.distance_m.total_cmp(&b.distance_m))
        .then(a.gid.cmp(&b.gid))
}

/// Pick the entry point to route to.
///
/// A preferred label overrides scoring and must exist in the context.
pub fn select_entry(
    assessments: &[EntryAssessment],
    lr_no: &str,
    preferred_label: Option<i32>,
) -> Result<EntryAssessment> {
    if assessments.is_empty() {
        return Err(EngineError::NoEntryPoints { lr_no: lr_no.to_string() });
    }
    match preferred_label {
        Some(label) => assessments.iter()
            .find(|a| a.label == label)
            .copied()
            .ok_or_else(|| EngineError::EntryPointNotFound { lr_no: lr_no.to_string(), label }),
        None => assessments.iter()
            .min_by(|a, b| by_score(a, b))
            .copied()
            .ok_or_else(|| EngineError::NoEntryPoints { lr_no: lr_no.to_string() }),
    }
}
