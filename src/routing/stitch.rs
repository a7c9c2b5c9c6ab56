//! Local route stitching over the road layer.
//!
//! The route is a chain of whole named roads: the road nearest the origin,
//! up to a few intermediate roads lying along the straight line between the
//! two anchors, then the access road of the entry point.

use geo::{Coord, Geometry, Line, Point};

use super::{RouteSegment, TravelMode};
use crate::config::RoutingConfig;
use crate::context::{ContextEntryPoint, ContextResolver, NearbyRoad};
use crate::error::{EngineError, Result};
use crate::geom::{closest_point, distance, line_length, Metric};
use crate::index::CollectionKind;
use crate::store::Snapshot;
use crate::types::LatLng;

/// Result of stitching a route to one entry point.
#[derive(Debug, Clone)]
pub struct Stitched {
    pub segments: Vec<RouteSegment>,
    pub access_road: NearbyRoad,
    /// Projection of the origin onto the start road.
    pub origin_anchor: LatLng,
    /// Projection of the entry point onto the access road.
    pub access_anchor: LatLng,
    /// Distance between the access road and the entry point.
    pub walk_distance_m: f64,
}

impl Stitched {
    pub fn road_distance_m(&self) -> f64 {
        self.segments.iter().map(|s| s.distance_m).sum()
    }
}

/// Named road closest to an entry point: its listed nearest road, else the
/// nearest named road at any distance.
pub fn access_road(resolver: &ContextResolver<'_>, entry: &ContextEntryPoint) -> Result<NearbyRoad> {
    if let Some(road) = entry.nearest_roads.first() {
        return Ok(road.clone());
    }
    resolver.named_roads_near(&Geometry::Point(entry.coordinates.to_point()), 1, None)
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::NoRoute(format!("no named road near entry point {}", entry.label)))
}

/// Closest point of a road to `at`, or `at` itself if the road has no usable geometry.
fn anchor(snapshot: &Snapshot, road_slot: usize, at: Coord<f64>) -> Coord<f64> {
    snapshot.index().layer(CollectionKind::Roads)
        .shape(road_slot)
        .and_then(|shape| closest_point(Metric::Geodesic, at, shape))
        .map_or(at, |(c, _)| c)
}

fn road_length(snapshot: &Snapshot, slot: usize) -> f64 {
    match snapshot.index().layer(CollectionKind::Roads).shape(slot) {
        Some(Geometry::MultiLineString(lines)) => line_length(Metric::Geodesic, lines),
        _ => 0.0,
    }
}

fn road_segment(snapshot: &Snapshot, slot: usize, sequence: usize, speed: f64) -> RouteSegment {
    let road = snapshot.road(slot);
    let distance_m = road_length(snapshot, slot);
    RouteSegment {
        sequence,
        road_gid: Some(road.gid),
        name: road.named().unwrap_or_default().to_string(),
        road_type: Some(road.class.clone()),
        distance_m,
        duration_s: if speed > 0.0 { distance_m / speed } else { 0.0 },
        maneuver: None,
        instruction: None,
        geometry: snapshot.index().layer(CollectionKind::Roads).shape(slot).cloned(),
    }
}

/// Named roads along the corridor between two anchors, best first. Roads
/// are told apart by slot, so two pieces of one street both count.
fn intermediate_roads(
    snapshot: &Snapshot,
    config: &RoutingConfig,
    from: Coord<f64>,
    to: Coord<f64>,
    start: usize,
    access: usize,
) -> Vec<usize> {
    let roads = snapshot.index().layer(CollectionKind::Roads);
    let corridor = Geometry::Line(Line::new(from, to));
    let (from, to) = (Geometry::Point(Point(from)), Geometry::Point(Point(to)));

    let mut ranked: Vec<(f64, u64, usize)> = snapshot.index()
        .within_distance(CollectionKind::Roads, &corridor, config.corridor_width_m, |slot| {
            slot != start && slot != access && snapshot.road(slot).named().is_some()
        })
        .into_iter()
        .filter_map(|hit| {
            let shape = roads.shape(hit.slot)?;
            let score = distance(Metric::Geodesic, &from, shape)? + distance(Metric::Geodesic, &to, shape)?;
            Some((score, hit.gid, hit.slot))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    ranked.into_iter()
        .take(config.max_intermediate_roads)
        .map(|(_, _, slot)| slot)
        .collect()
}

/// Stitch a route from `origin` to `entry` using whole named roads.
pub fn stitch(
    resolver: &ContextResolver<'_>,
    config: &RoutingConfig,
    origin: LatLng,
    entry: &ContextEntryPoint,
    mode: TravelMode,
) -> Result<Stitched> {
    let snapshot = resolver.snapshot();
    let access_road = access_road(resolver, entry)?;
    let start_road = resolver.named_roads_near(&Geometry::Point(origin.to_point()), 1, None)
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::NoRoute("no named road near the origin".into()))?;

    let origin_anchor = anchor(snapshot, start_road.slot, origin.to_coord());
    let access_anchor = anchor(snapshot, access_road.slot, entry.coordinates.to_coord());

    let slots = if start_road.slot == access_road.slot {
        vec![start_road.slot]
    } else {
        let mut slots = vec![start_road.slot];
        slots.extend(intermediate_roads(snapshot, config, origin_anchor, access_anchor, start_road.slot, access_road.slot));
        slots.push(access_road.slot);
        slots
    };

    let speed = config.speeds.for_mode(mode);
    let segments = slots.iter()
        .enumerate()
        .map(|(i, &slot)| road_segment(snapshot, slot, i + 1, speed))
        .collect();

    Ok(Stitched {
        segments,
        walk_distance_m: access_road.distance_m,
        access_road,
        origin_anchor: origin_anchor.into(),
        access_anchor: access_anchor.into(),
    })
}
