use std::borrow::Cow;

use geo::{Coord, Geometry, MapCoords};
use proj4rs::{proj::Proj, transform::transform};

use super::mercator;
use crate::error::{EngineError, Result};

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";
const WEB_MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs";

/// How distances are measured in a coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Degrees on the sphere; distances are great-circle meters.
    Geodesic,
    /// Projected meters; distances are Euclidean.
    Planar,
}

/// Coordinate reference system of a source collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Crs {
    #[default]
    Wgs84,
    WebMercator,
    /// Any other system, described by a PROJ.4 definition.
    Proj4 { epsg: Option<u32>, definition: String },
}

impl Crs {
    /// Look up a CRS by EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self> {
        let proj4 = |definition: String| Crs::Proj4 { epsg: Some(code), definition };
        Ok(match code {
            4326 | 4979 => Crs::Wgs84,
            3857 | 3785 | 900913 | 102100 => Crs::WebMercator,
            4269 => proj4("+proj=longlat +datum=NAD83 +no_defs +type=crs".into()),
            // Arc 1960 / UTM zones 36S and 37S (Kenya)
            21036 | 21037 => proj4(format!(
                "+proj=utm +zone={} +south +ellps=clrk80 +towgs84=-160,-6,-302,0,0,0,0 +units=m +no_defs +type=crs",
                code - 21000,
            )),
            32601..=32660 => proj4(format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs +type=crs", code - 32600)),
            32701..=32760 => proj4(format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs +type=crs", code - 32700)),
            _ => return Err(EngineError::InvalidInput(format!("unsupported EPSG code {code}"))),
        })
    }

    /// Parse a CRS name as found in GeoJSON `crs` members or configuration:
    /// `EPSG:3857`, `urn:ogc:def:crs:EPSG::21037`, `CRS84`, or a raw PROJ.4 string.
    pub fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.starts_with("+proj=") {
            return Ok(Crs::Proj4 { epsg: None, definition: name.to_string() });
        }
        if name.ends_with("CRS84") {
            return Ok(Crs::Wgs84);
        }
        let code = name.rsplit(':').next()
            .and_then(|tail| tail.trim().parse::<u32>().ok())
            .ok_or_else(|| EngineError::InvalidInput(format!("unrecognized CRS name {name:?}")))?;
        Self::from_epsg(code)
    }

    /// EPSG code, if known.
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Wgs84 => Some(4326),
            Crs::WebMercator => Some(3857),
            Crs::Proj4 { epsg, .. } => *epsg,
        }
    }

    /// True if coordinates are longitude/latitude degrees.
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Wgs84 => true,
            Crs::WebMercator => false,
            Crs::Proj4 { definition, .. } => definition.contains("+proj=longlat") || definition.contains("+proj=latlong"),
        }
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        if self.is_geographic() { Metric::Geodesic } else { Metric::Planar }
    }

    fn definition(&self) -> Cow<'_, str> {
        match self {
            Crs::Wgs84 => Cow::Borrowed(WGS84),
            Crs::WebMercator => Cow::Borrowed(WEB_MERCATOR),
            Crs::Proj4 { definition, .. } => Cow::Borrowed(definition),
        }
    }
}

enum Kind {
    Identity,
    GeographicToMercator,
    MercatorToGeographic,
    Proj { from: Proj, to: Proj, from_geographic: bool, to_geographic: bool },
}

/// Converts coordinates between two reference systems. Built once per collection.
pub struct Transformer {
    kind: Kind,
}

impl Transformer {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let kind = match (from, to) {
            (a, b) if a == b => Kind::Identity,
            (Crs::Wgs84, Crs::WebMercator) => Kind::GeographicToMercator,
            (Crs::WebMercator, Crs::Wgs84) => Kind::MercatorToGeographic,
            _ => {
                let build = |crs: &Crs| {
                    let definition = crs.definition();
                    Proj::from_proj_string(&definition)
                        .map_err(|e| EngineError::IndexBuild(format!("failed to build projection {definition:?}: {e}")))
                };
                Kind::Proj {
                    from: build(from)?,
                    to: build(to)?,
                    from_geographic: from.is_geographic(),
                    to_geographic: to.is_geographic(),
                }
            }
        };
        Ok(Self { kind })
    }

    /// Transform a single coordinate. Geographic coordinates are in degrees.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        match &self.kind {
            Kind::Identity => Ok(coord),
            Kind::GeographicToMercator => Ok(Coord { x: mercator::lon_to_x(coord.x), y: mercator::lat_to_y(coord.y) }),
            Kind::MercatorToGeographic => Ok(Coord { x: mercator::x_to_lon(coord.x), y: mercator::y_to_lat(coord.y) }),
            Kind::Proj { from, to, from_geographic, to_geographic } => {
                // proj4rs works in radians for geographic systems
                let mut point = if *from_geographic {
                    (coord.x.to_radians(), coord.y.to_radians(), 0.0)
                } else {
                    (coord.x, coord.y, 0.0)
                };
                transform(from, to, &mut point)
                    .map_err(|e| EngineError::IndexBuild(format!("CRS transform failed at ({}, {}): {e}", coord.x, coord.y)))?;
                let out = if *to_geographic {
                    Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
                } else {
                    Coord { x: point.0, y: point.1 }
                };
                if !out.x.is_finite() || !out.y.is_finite() {
                    return Err(EngineError::IndexBuild(format!("CRS transform produced non-finite output at ({}, {})", coord.x, coord.y)));
                }
                Ok(out)
            }
        }
    }

    /// Transform every coordinate of a geometry.
    pub fn geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        if matches!(self.kind, Kind::Identity) {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|coord| self.coord(coord))
    }
}
