//! Listing and attribute search over the parcel collection.

use std::sync::Arc;

use geo::Geometry;
use serde::{Deserialize, Serialize};

use crate::address::{physical_address, short_code};
use crate::config::SearchConfig;
use crate::context::{ContextResolver, NearbyRoad};
use crate::error::{EngineError, Result};
use crate::index::CollectionKind;
use crate::types::{AdminBlock, LatLng, Parcel, ParcelSummary};

/// One page of an ordered listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Filters for an address search. All given filters must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressQuery {
    /// Case-insensitive substring of the registration code.
    pub lr_no: Option<String>,
    /// Case-insensitive substring of the folio reference.
    pub fr_no: Option<String>,
    pub near: Option<NearQuery>,
}

/// Restrict results to parcels within `radius_m` of a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearQuery {
    pub at: LatLng,
    pub radius_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressEntryPoint {
    pub gid: u64,
    pub label: i32,
    pub coordinates: LatLng,
    pub distance_m: f64,
}

/// A parcel with everything needed to present it as an address.
#[derive(Debug, Clone, Serialize)]
pub struct AddressRecord {
    pub parcel: Arc<Parcel>,
    pub centroid: Option<LatLng>,
    /// Ordered by label.
    pub entry_points: Vec<AddressEntryPoint>,
    pub nearby_roads: Vec<NearbyRoad>,
    pub administrative_block: Option<Arc<AdminBlock>>,
    pub physical_address: String,
    pub short_code: String,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Parcels whose registration code contains `query`, ordered by code.
pub fn search_parcels(resolver: &ContextResolver<'_>, config: &SearchConfig, query: &str) -> Result<Vec<ParcelSummary>> {
    let query = query.trim();
    if query.chars().count() < config.min_query_len {
        return Err(EngineError::InvalidInput(format!(
            "search query must be at least {} characters",
            config.min_query_len
        )));
    }
    let snapshot = resolver.snapshot();
    let mut slots: Vec<usize> = snapshot.parcels().iter()
        .enumerate()
        .filter(|(_, parcel)| contains_ignore_case(&parcel.lr_no, query))
        .map(|(slot, _)| slot)
        .collect();
    slots.sort_by(|&a, &b| snapshot.parcel(a).lr_no.cmp(&snapshot.parcel(b).lr_no));
    slots.truncate(config.lr_no_limit);
    Ok(slots.into_iter().map(|slot| snapshot.summary(slot)).collect())
}

/// Parcels ordered by gid, one page at a time. Pages start at 1.
pub fn list_parcels(
    resolver: &ContextResolver<'_>,
    config: &SearchConfig,
    page: usize,
    limit: Option<usize>,
) -> Result<Page<ParcelSummary>> {
    let limit = limit.unwrap_or(config.default_page_size);
    if page == 0 {
        return Err(EngineError::InvalidInput("page numbers start at 1".into()));
    }
    if limit == 0 || limit > config.max_page_size {
        return Err(EngineError::InvalidInput(format!("limit must be between 1 and {}", config.max_page_size)));
    }

    let snapshot = resolver.snapshot();
    let mut slots: Vec<usize> = (0..snapshot.parcels().len()).collect();
    slots.sort_by_key(|&slot| snapshot.parcel(slot).gid);

    let total = slots.len();
    let data = slots.into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .map(|slot| snapshot.summary(slot))
        .collect();
    Ok(Page { data, page, limit, total, total_pages: total.div_ceil(limit) })
}

fn address_record(resolver: &ContextResolver<'_>, config: &SearchConfig, slot: usize) -> AddressRecord {
    let snapshot = resolver.snapshot();
    let parcel = Arc::clone(snapshot.parcel(slot));
    let shape = snapshot.index().layer(CollectionKind::Parcels).shape(slot);

    let (mut entry_points, nearby_roads, administrative_block) = match shape {
        Some(shape) => {
            let entries = snapshot.index()
                .within_distance(CollectionKind::EntryPoints, shape, config.entry_point_radius_m, |_| true)
                .into_iter()
                .filter_map(|hit| {
                    let entry = snapshot.entry_point(hit.slot);
                    Some(AddressEntryPoint {
                        gid: entry.gid,
                        label: entry.label,
                        coordinates: snapshot.entry_point_position(hit.slot)?,
                        distance_m: hit.distance,
                    })
                })
                .collect::<Vec<_>>();
            let roads = resolver.roads_near(shape, config.nearby_road_limit, Some(config.nearby_road_radius_m));
            let block = resolver.intersecting_block(shape).map(|b| Arc::clone(snapshot.admin_block(b)));
            (entries, roads, block)
        }
        None => (Vec::new(), Vec::new(), None),
    };
    entry_points.sort_by_key(|e| (e.label, e.gid));

    let access_road = nearby_roads.iter().map(|r| r.name.as_str()).find(|name| !name.trim().is_empty());
    let address = physical_address(
        &parcel,
        administrative_block.as_deref(),
        access_road,
        entry_points.first().map(|e| e.label),
    );

    AddressRecord {
        short_code: short_code(&parcel),
        centroid: snapshot.centroid(slot),
        parcel,
        entry_points,
        nearby_roads,
        administrative_block,
        physical_address: address,
    }
}

/// Parcels matching every filter of `query`, at most `address_limit` of them.
///
/// With a position filter results are ordered by distance, otherwise by gid.
pub fn search_addresses(
    resolver: &ContextResolver<'_>,
    config: &SearchConfig,
    query: &AddressQuery,
) -> Result<Vec<AddressRecord>> {
    let snapshot = resolver.snapshot();

    let candidates: Vec<usize> = match query.near {
        Some(near) => {
            let at = near.at.validate()?;
            let radius = near.radius_m.unwrap_or(config.default_radius_m);
            if !radius.is_finite() || radius <= 0.0 || radius > config.max_radius_m {
                return Err(EngineError::InvalidInput(format!(
                    "radius must be greater than 0 and at most {} m, got {radius}",
                    config.max_radius_m
                )));
            }
            snapshot.index()
                .within_distance(CollectionKind::Parcels, &Geometry::Point(at.to_point()), radius, |_| true)
                .into_iter()
                .map(|hit| hit.slot)
                .collect()
        }
        None => {
            let mut slots: Vec<usize> = (0..snapshot.parcels().len()).collect();
            slots.sort_by_key(|&slot| snapshot.parcel(slot).gid);
            slots
        }
    };

    let matches = |value: &str, filter: &Option<String>| match filter.as_deref().map(str::trim) {
        Some(filter) if !filter.is_empty() => contains_ignore_case(value, filter),
        _ => true,
    };

    Ok(candidates.into_iter()
        .filter(|&slot| {
            let parcel = snapshot.parcel(slot);
            matches(&parcel.lr_no, &query.lr_no) && matches(&parcel.fr_no, &query.fr_no)
        })
        .take(config.address_limit)
        .map(|slot| address_record(resolver, config, slot))
        .collect())
}
