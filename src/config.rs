//! Tunable thresholds and weights.
//!
//! Every value has a default; a JSON file may override any subset of them.

use std::{path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::routing::TravelMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub context: ContextConfig,
    pub routing: RoutingConfig,
    pub tiles: TileConfig,
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Read a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_slice(&bytes)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make queries meaningless (negative radii, zero extent).
    pub fn validate(&self) -> Result<()> {
        let radii = [
            ("context.point_tolerance_m", self.context.point_tolerance_m),
            ("context.entry_point_radius_m", self.context.entry_point_radius_m),
            ("context.road_radius_m", self.context.road_radius_m),
            ("routing.access_quality_radius_m", self.routing.access_quality_radius_m),
            ("routing.corridor_width_m", self.routing.corridor_width_m),
            ("search.entry_point_radius_m", self.search.entry_point_radius_m),
            ("search.nearby_road_radius_m", self.search.nearby_road_radius_m),
        ];
        for (name, value) in radii {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative distance, got {value}");
            }
        }
        if self.tiles.extent == 0 {
            bail!("tiles.extent must be positive");
        }
        if self.search.max_page_size == 0 || self.search.default_page_size > self.search.max_page_size {
            bail!("search page sizes are inconsistent");
        }
        Ok(())
    }
}

/// Thresholds used when resolving a parcel's surroundings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Boundary slack when locating the parcel under a point.
    pub point_tolerance_m: f64,
    /// Maximum distance between an entry point and the parcel boundary.
    pub entry_point_radius_m: f64,
    /// Maximum distance between an entry point and a listed road.
    pub road_radius_m: f64,
    pub roads_per_entry_point: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            point_tolerance_m: 1.0,
            entry_point_radius_m: 5.0,
            road_radius_m: 50.0,
            roads_per_entry_point: 3,
        }
    }
}

/// Entry-point scoring and route stitching parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Roads farther than this from an entry point do not contribute to its quality.
    pub access_quality_radius_m: f64,
    pub distance_weight: f64,
    pub quality_weight: f64,
    /// Quality lost per meter between the entry point and the road.
    pub penalty_per_meter: f64,
    pub max_distance_penalty: f64,
    /// Quality assigned to a road the travel mode cannot use.
    pub inaccessible_quality: f64,
    /// Intermediate roads must lie within this distance of the anchor line.
    pub corridor_width_m: f64,
    pub max_intermediate_roads: usize,
    pub provider_timeout_ms: u64,
    /// Sort alternatives whose entry point has no usable road after the others.
    pub demote_inaccessible_alternatives: bool,
    pub speeds: TravelSpeeds,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            access_quality_radius_m: 100.0,
            distance_weight: 0.6,
            quality_weight: 0.4,
            penalty_per_meter: 0.05,
            max_distance_penalty: 5.0,
            inaccessible_quality: -5.0,
            corridor_width_m: 1000.0,
            max_intermediate_roads: 5,
            provider_timeout_ms: 5000,
            demote_inaccessible_alternatives: false,
            speeds: TravelSpeeds::default(),
        }
    }
}

impl RoutingConfig {
    #[inline]
    pub fn provider_timeout(&self) -> Duration { Duration::from_millis(self.provider_timeout_ms) }
}

/// Nominal speeds in meters per second, used to estimate local route durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelSpeeds {
    pub walking: f64,
    pub cycling: f64,
    pub driving: f64,
    pub motorcycle: f64,
}

impl Default for TravelSpeeds {
    fn default() -> Self {
        Self { walking: 1.4, cycling: 4.2, driving: 11.1, motorcycle: 11.1 }
    }
}

impl TravelSpeeds {
    pub fn for_mode(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walking => self.walking,
            TravelMode::Cycling => self.cycling,
            TravelMode::Driving => self.driving,
            TravelMode::Motorcycle => self.motorcycle,
        }
    }
}

/// Vector tile layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub extent: u32,
    /// Clip buffer around the tile, in tile units.
    pub buffer: u32,
    pub layer_name: String,
    /// Douglas-Peucker tolerance in tile units; 0 disables simplification.
    pub simplify_tolerance: f64,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self { extent: 4096, buffer: 256, layer_name: "parcels".into(), simplify_tolerance: 0.0 }
    }
}

/// Limits for the listing and search operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub min_query_len: usize,
    pub lr_no_limit: usize,
    pub address_limit: usize,
    pub default_radius_m: f64,
    pub max_radius_m: f64,
    pub entry_point_radius_m: f64,
    pub nearby_road_radius_m: f64,
    pub nearby_road_limit: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            lr_no_limit: 20,
            address_limit: 50,
            default_radius_m: 1000.0,
            max_radius_m: 10_000.0,
            entry_point_radius_m: 50.0,
            nearby_road_radius_m: 50.0,
            nearby_road_limit: 5,
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.context.point_tolerance_m, 1.0);
        assert_eq!(config.context.entry_point_radius_m, 5.0);
        assert_eq!(config.context.road_radius_m, 50.0);
        assert_eq!(config.routing.access_quality_radius_m, 100.0);
        assert_eq!(config.routing.corridor_width_m, 1000.0);
        assert_eq!(config.tiles.extent, 4096);
        assert_eq!(config.tiles.layer_name, "parcels");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_slice(br#"{"routing": {"corridor_width_m": 250.0}}"#).unwrap();
        assert_eq!(config.routing.corridor_width_m, 250.0);
        assert_eq!(config.routing.max_intermediate_roads, 5);
        assert_eq!(config.context.road_radius_m, 50.0);
    }

    #[test]
    fn negative_radius_is_rejected() {
        let result = EngineConfig::from_json_slice(br#"{"context": {"road_radius_m": -1.0}}"#);
        assert!(result.is_err());
    }
}
