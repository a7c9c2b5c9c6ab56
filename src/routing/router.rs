use std::sync::Arc;

use geo::Geometry;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::instructions::{local_instructions, provider_instructions, provider_legs};
use super::select::{assess_entries, select_entry, EntryAssessment};
use super::stitch::stitch;
use super::{
    directions_with_timeout, traffic_level, Destination, Directions, DirectionsProvider, ProviderError, Route,
    RouteRequest, RouteResult, RouteSegment, RouteSource, TrafficLevel, TravelMode,
};
use crate::address::{physical_address, short_code};
use crate::config::RoutingConfig;
use crate::context::{ContextResolver, ParcelContext};
use crate::error::{EngineError, Result};
use crate::types::LatLng;

/// Plans routes to parcel entry points against one snapshot.
#[derive(Clone, Copy)]
pub struct Router<'a> {
    resolver: ContextResolver<'a>,
    config: &'a RoutingConfig,
    provider: Option<&'a Arc<dyn DirectionsProvider>>,
}

impl<'a> Router<'a> {
    pub fn new(
        resolver: ContextResolver<'a>,
        config: &'a RoutingConfig,
        provider: Option<&'a Arc<dyn DirectionsProvider>>,
    ) -> Self {
        Self { resolver, config, provider }
    }

    /// Context of the destination parcel; it must have at least one entry point.
    fn destination(&self, lr_no: &str) -> Result<ParcelContext> {
        let context = self.resolver.resolve_by_lr_no(lr_no)?;
        if context.entry_points.is_empty() {
            return Err(EngineError::NoEntryPoints { lr_no: context.parcel.lr_no.clone() });
        }
        Ok(context)
    }

    /// Route to the best entry point of the destination, or to the preferred one.
    pub fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResult> {
        let origin = request.origin.validate()?;
        let context = self.destination(&request.destination_lr_no)?;
        let snapshot = self.resolver.snapshot();

        let assessments = assess_entries(snapshot, self.config, &context, origin, request.mode);
        let chosen = select_entry(&assessments, &context.parcel.lr_no, request.preferred_entry_label)?;
        debug!(
            lr_no = %context.parcel.lr_no,
            label = chosen.label,
            score = chosen.score,
            accessible = chosen.accessible,
            "selected entry point"
        );

        let result = self.route_to_entry(origin, &context, &chosen, request.mode)?;
        info!(
            lr_no = %context.parcel.lr_no,
            mode = %request.mode,
            source = ?result.route.source,
            distance_m = result.route.total_distance_m,
            "route calculated"
        );
        Ok(result)
    }

    /// One route per entry point of the destination, shortest first.
    ///
    /// Entry points that cannot be routed to are logged and left out.
    pub fn alternative_routes(&self, origin: LatLng, lr_no: &str, mode: TravelMode) -> Result<Vec<RouteResult>> {
        let origin = origin.validate()?;
        let context = self.destination(lr_no)?;
        let assessments = assess_entries(self.resolver.snapshot(), self.config, &context, origin, mode);

        let attempts: Vec<(EntryAssessment, Result<RouteResult>)> = assessments.par_iter()
            .map(|assessment| (*assessment, self.route_to_entry(origin, &context, assessment, mode)))
            .collect();

        let mut routes: Vec<RouteResult> = attempts.into_iter()
            .filter_map(|(assessment, attempt)| match attempt {
                Ok(route) => Some(route),
                Err(error) => {
                    warn!(lr_no = %context.parcel.lr_no, label = assessment.label, %error, "no route to entry point");
                    None
                }
            })
            .collect();

        let demote = self.config.demote_inaccessible_alternatives;
        routes.sort_by(|a, b| {
            let rank = |r: &RouteResult| demote && !r.route.entry_point_accessible;
            rank(a).cmp(&rank(b))
                .then(a.total_distance_m().total_cmp(&b.total_distance_m()))
                .then(a.destination.entry_point.gid.cmp(&b.destination.entry_point.gid))
        });
        Ok(routes)
    }

    /// Provider directions between two positions, with no parcel involved and
    /// no local fallback.
    pub fn route_preview(&self, origin: LatLng, destination: LatLng, mode: TravelMode) -> Result<Directions> {
        let (origin, destination) = (origin.validate()?, destination.validate()?);
        let provider = self.provider.ok_or(ProviderError::NotConfigured)?;
        Ok(directions_with_timeout(provider, origin, destination, mode, self.config.provider_timeout())?)
    }

    /// Provider directions to `to`, or `None` when there is no provider or it failed.
    fn provider_directions(&self, origin: LatLng, to: LatLng, mode: TravelMode, lr_no: &str) -> Option<Directions> {
        let provider = self.provider?;
        directions_with_timeout(provider, origin, to, mode, self.config.provider_timeout())
            .inspect_err(|error| warn!(lr_no, %error, "directions provider unavailable, using local route"))
            .ok()
    }

    fn route_to_entry(
        &self,
        origin: LatLng,
        context: &ParcelContext,
        assessment: &EntryAssessment,
        mode: TravelMode,
    ) -> Result<RouteResult> {
        let entry = context.entry_points.get(assessment.index)
            .ok_or_else(|| EngineError::EntryPointNotFound { lr_no: context.parcel.lr_no.clone(), label: assessment.label })?;
        let lr_no = context.parcel.lr_no.as_str();
        let stitched = stitch(&self.resolver, self.config, origin, entry, mode)?;
        let walk_distance_m = stitched.walk_distance_m;
        let walking_speed = self.config.speeds.walking;
        let walk_duration_s = if walking_speed > 0.0 { walk_distance_m / walking_speed } else { 0.0 };

        let (route, instructions) = match self.provider_directions(origin, stitched.access_anchor, mode, lr_no) {
            Some(directions) => {
                let segments = provider_segments(&directions);
                let instructions = provider_instructions(&directions, entry, walk_distance_m, lr_no);
                let route = Route {
                    total_distance_m: segments.iter().map(|s| s.distance_m).sum::<f64>() + walk_distance_m,
                    total_duration_s: directions.total_duration_s + walk_duration_s,
                    segments,
                    mode,
                    source: RouteSource::Provider,
                    has_traffic: !directions.congestion.is_empty(),
                    traffic_level: traffic_level(&directions.congestion),
                    entry_point_accessible: assessment.accessible,
                    walk_distance_m,
                };
                (route, instructions)
            }
            None => {
                let segments = &stitched.segments;
                let instructions = local_instructions(segments, entry, walk_distance_m, lr_no);
                let route = Route {
                    total_distance_m: stitched.road_distance_m() + walk_distance_m,
                    total_duration_s: segments.iter().map(|s| s.duration_s).sum::<f64>() + walk_duration_s,
                    segments: segments.clone(),
                    mode,
                    source: RouteSource::Local,
                    has_traffic: false,
                    traffic_level: TrafficLevel::Unknown,
                    entry_point_accessible: assessment.accessible,
                    walk_distance_m,
                };
                (route, instructions)
            }
        };

        let parcel = &context.parcel;
        let access_name = stitched.access_road.name.as_str();
        let destination = Destination {
            parcel: self.resolver.snapshot().summary(context.slot),
            entry_point: entry.clone(),
            physical_address: physical_address(parcel, context.block(), Some(access_name), Some(entry.label)),
            short_code: short_code(parcel),
            access_road: Some(stitched.access_road),
        };
        Ok(RouteResult { destination, route, instructions })
    }
}

fn provider_segments(directions: &Directions) -> Vec<RouteSegment> {
    provider_legs(directions)
        .enumerate()
        .map(|(i, leg)| RouteSegment {
            sequence: i + 1,
            road_gid: None,
            name: leg.name.clone(),
            road_type: None,
            distance_m: leg.distance_m,
            duration_s: leg.duration_s,
            maneuver: Some(leg.maneuver.clone()),
            instruction: leg.instruction.clone(),
            geometry: Some(Geometry::LineString(leg.geometry.clone())),
        })
        .collect()
}
