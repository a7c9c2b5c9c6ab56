//! GeoJSON FeatureCollections in and out.
//!
//! Each collection is one FeatureCollection whose properties use the column
//! names of the cadastral source tables (`lr_no`, `fr_no`, `fclass`,
//! `constituen`, `county_nam`, ...). The legacy `crs` member names the
//! coordinate system; without it coordinates are WGS84.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde::Serializer;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::geom::Crs;
use crate::store::{Collection, Collections};
use crate::types::{AdminBlock, EntryPoint, Parcel, Road, RoadClass};

pub const PARCELS_FILE: &str = "parcels.geojson";
pub const ENTRY_POINTS_FILE: &str = "entry_points.geojson";
pub const ROADS_FILE: &str = "roads.geojson";
pub const ADMIN_BLOCKS_FILE: &str = "admin_blocks.geojson";

type Properties = Map<String, Value>;

/// A feature's properties and its parsed geometry (`None` for a null geometry).
struct RawFeature {
    id: Option<u64>,
    properties: Properties,
    geometry: Option<Geometry<f64>>,
}

/// Coordinate system named by a FeatureCollection's `crs` member.
fn collection_crs(value: &Value) -> Result<Crs> {
    match value["crs"]["properties"]["name"].as_str() {
        Some(name) => Crs::from_name(name).with_context(|| format!("Unsupported crs {name:?}")),
        None => Ok(Crs::Wgs84),
    }
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pair = value.as_array().filter(|a| a.len() >= 2)
        .ok_or_else(|| anyhow!("Invalid position: expected [x, y]"))?;
    let x = pair[0].as_f64().ok_or_else(|| anyhow!("Invalid position: x must be a number"))?;
    let y = pair[1].as_f64().ok_or_else(|| anyhow!("Invalid position: y must be a number"))?;
    Ok(Coord { x, y })
}

fn parse_positions(value: &Value) -> Result<Vec<Coord<f64>>> {
    value.as_array()
        .ok_or_else(|| anyhow!("Invalid coordinates: expected an array of positions"))?
        .iter()
        .map(parse_position)
        .collect()
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array().ok_or_else(|| anyhow!("Invalid Polygon: expected an array of rings"))?;
    let mut rings = rings.iter().map(|ring| parse_positions(ring).map(LineString));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString(Vec::new()));
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    // Polygon::new closes open rings.
    Ok(Polygon::new(exterior, interiors))
}

fn parse_many<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value.as_array()
        .ok_or_else(|| anyhow!("Invalid coordinates: expected an array"))?
        .iter()
        .map(parse)
        .collect()
}

/// Parse a GeoJSON geometry object. A JSON `null` yields `None`.
pub fn parse_geometry(value: &Value) -> Result<Option<Geometry<f64>>> {
    if value.is_null() {
        return Ok(None);
    }
    let coords = &value["coordinates"];
    let geometry = match value["type"].as_str() {
        Some("Point") => Geometry::Point(Point(parse_position(coords)?)),
        Some("MultiPoint") => Geometry::MultiPoint(MultiPoint(parse_many(coords, |c| parse_position(c).map(Point))?)),
        Some("LineString") => Geometry::LineString(LineString(parse_positions(coords)?)),
        Some("MultiLineString") => Geometry::MultiLineString(MultiLineString(
            parse_many(coords, |c| parse_positions(c).map(LineString))?,
        )),
        Some("Polygon") => Geometry::Polygon(parse_polygon(coords)?),
        Some("MultiPolygon") => Geometry::MultiPolygon(MultiPolygon(parse_many(coords, parse_polygon)?)),
        Some("GeometryCollection") => {
            let members = value["geometries"].as_array()
                .ok_or_else(|| anyhow!("Invalid GeometryCollection: missing geometries"))?;
            let members = members.iter()
                .filter_map(|m| parse_geometry(m).transpose())
                .collect::<Result<Vec<_>>>()?;
            Geometry::GeometryCollection(GeometryCollection(members))
        }
        other => bail!("Unsupported geometry type {other:?}"),
    };
    Ok(Some(geometry))
}

/// Parse a FeatureCollection. Features with unreadable geometry keep their
/// properties and get no geometry, so index build can report them.
fn read_features(bytes: &[u8]) -> Result<(Crs, Vec<RawFeature>)> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("Expected a FeatureCollection, got {:?}", value["type"]);
    }
    let crs = collection_crs(&value)?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?;

    let features = features.iter()
        .enumerate()
        .map(|(i, feature)| {
            let geometry = parse_geometry(&feature["geometry"]).unwrap_or_else(|e| {
                warn!(feature = i, error = %e, "unreadable geometry");
                None
            });
            RawFeature {
                id: number_u64(&feature["id"]),
                properties: feature["properties"].as_object().cloned().unwrap_or_default(),
                geometry,
            }
        })
        .collect();
    Ok((crs, features))
}

/// Integer from a JSON number or numeric string.
fn number_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_str()?.trim().parse().ok())
}

fn number_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str()?.trim().parse().ok())
}

fn number_f64(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| value.as_str()?.trim().parse().ok())
}

fn text(properties: &Properties, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawFeature {
    fn gid(&self) -> Result<u64> {
        self.properties.get("gid").and_then(number_u64).or(self.id)
            .ok_or_else(|| anyhow!("feature has no gid"))
    }
}

fn into_multipolygon(geometry: Option<Geometry<f64>>) -> MultiPolygon<f64> {
    match geometry {
        Some(Geometry::MultiPolygon(mp)) => mp,
        Some(Geometry::Polygon(p)) => MultiPolygon(vec![p]),
        Some(Geometry::Rect(r)) => MultiPolygon(vec![r.to_polygon()]),
        Some(Geometry::GeometryCollection(gc)) => MultiPolygon(
            gc.into_iter().flat_map(|g| into_multipolygon(Some(g)).0).collect(),
        ),
        _ => MultiPolygon(Vec::new()),
    }
}

fn into_multilinestring(geometry: Option<Geometry<f64>>) -> MultiLineString<f64> {
    match geometry {
        Some(Geometry::MultiLineString(mls)) => mls,
        Some(Geometry::LineString(ls)) => MultiLineString(vec![ls]),
        Some(Geometry::Line(line)) => MultiLineString(vec![LineString(vec![line.start, line.end])]),
        _ => MultiLineString(Vec::new()),
    }
}

fn into_point(geometry: Option<Geometry<f64>>) -> Option<Point<f64>> {
    match geometry? {
        Geometry::Point(p) => Some(p),
        Geometry::MultiPoint(mp) => mp.0.into_iter().next(),
        _ => None,
    }
}

/// Parse records, skipping features whose attributes cannot be read.
fn read_records<T>(bytes: &[u8], kind: &str, parse: impl Fn(RawFeature) -> Result<T>) -> Result<Collection<T>> {
    let (crs, features) = read_features(bytes)?;
    let total = features.len();
    let records: Vec<T> = features.into_iter()
        .enumerate()
        .filter_map(|(i, feature)| {
            parse(feature).inspect_err(|e| warn!(collection = kind, feature = i, error = %e, "skipping feature")).ok()
        })
        .collect();
    if total > 0 && records.is_empty() {
        bail!("No readable {kind} features");
    }
    Ok(Collection::new(crs, records))
}

pub fn read_parcels(bytes: &[u8]) -> Result<Collection<Parcel>> {
    read_records(bytes, "parcels", |feature| {
        let p = &feature.properties;
        Ok(Parcel {
            gid: feature.gid()?,
            lr_no: text(p, "lr_no").ok_or_else(|| anyhow!("parcel has no lr_no"))?.trim().to_string(),
            fr_no: text(p, "fr_no").unwrap_or_default(),
            area: p.get("area").and_then(number_f64).unwrap_or(0.0),
            entity: text(p, "entity").unwrap_or_default(),
            objectid: p.get("objectid").and_then(number_i64),
            pas: text(p, "pas"),
            geometry: into_multipolygon(feature.geometry),
        })
    })
}

pub fn read_entry_points(bytes: &[u8]) -> Result<Collection<EntryPoint>> {
    read_records(bytes, "entry_points", |feature| {
        let gid = feature.gid()?;
        let label = feature.properties.get("label").and_then(number_i64)
            .and_then(|l| i32::try_from(l).ok())
            .ok_or_else(|| anyhow!("entry point {gid} has no label"))?;
        let geometry = into_point(feature.geometry).ok_or_else(|| anyhow!("entry point {gid} has no point geometry"))?;
        Ok(EntryPoint { gid, label, geometry })
    })
}

pub fn read_roads(bytes: &[u8]) -> Result<Collection<Road>> {
    read_records(bytes, "roads", |feature| {
        let p = &feature.properties;
        let class: RoadClass = text(p, "fclass").unwrap_or_default().parse().unwrap_or_else(|never| match never {});
        Ok(Road {
            gid: feature.gid()?,
            name: text(p, "name"),
            class,
            reference: text(p, "ref").filter(|r| !r.trim().is_empty()),
            osm_id: p.get("osm_id").and_then(number_i64),
            // OSM shapefile convention: F/T one way (with/against digitizing), B both.
            oneway: text(p, "oneway").and_then(|o| match o.trim() {
                "F" | "T" => Some(true),
                "B" => Some(false),
                _ => None,
            }),
            maxspeed: p.get("maxspeed").and_then(number_u64)
                .filter(|&s| s > 0)
                .and_then(|s| u32::try_from(s).ok()),
            geometry: into_multilinestring(feature.geometry),
        })
    })
}

pub fn read_admin_blocks(bytes: &[u8]) -> Result<Collection<AdminBlock>> {
    read_records(bytes, "admin_blocks", |feature| {
        let p = &feature.properties;
        Ok(AdminBlock {
            gid: feature.gid()?,
            name: text(p, "name").unwrap_or_default(),
            constituency: text(p, "constituen").unwrap_or_default(),
            county: text(p, "county_nam").unwrap_or_default(),
            short_name: text(p, "short_name"),
            const_code: p.get("const_code").and_then(number_i64),
            geometry: into_multipolygon(feature.geometry),
        })
    })
}

fn read_file<T>(dir: &Path, name: &str, read: impl Fn(&[u8]) -> Result<Collection<T>>) -> Result<Collection<T>> {
    let path = dir.join(name);
    if !path.exists() {
        warn!(path = %path.display(), "collection file missing, loading it empty");
        return Ok(Collection::default());
    }
    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    read(&bytes).with_context(|| format!("Failed to load {}", path.display()))
}

/// Load the four collections from a directory. Missing files load as empty
/// collections; the parcels file is required.
pub fn read_collections_dir(dir: &Path) -> Result<Collections> {
    if !dir.join(PARCELS_FILE).exists() {
        bail!("{} not found in {}", PARCELS_FILE, dir.display());
    }
    let collections = Collections {
        parcels: read_file(dir, PARCELS_FILE, read_parcels)?,
        entry_points: read_file(dir, ENTRY_POINTS_FILE, read_entry_points)?,
        roads: read_file(dir, ROADS_FILE, read_roads)?,
        admin_blocks: read_file(dir, ADMIN_BLOCKS_FILE, read_admin_blocks)?,
    };
    info!(
        dir = %dir.display(),
        parcels = collections.parcels.len(),
        entry_points = collections.entry_points.len(),
        roads = collections.roads.len(),
        admin_blocks = collections.admin_blocks.len(),
        "read collections"
    );
    Ok(collections)
}

fn positions(ls: &LineString<f64>) -> Value {
    Value::Array(ls.coords().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_rings(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(positions));
    Value::Array(rings)
}

/// GeoJSON geometry object for a geometry.
pub fn geometry_to_value(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": [p.x(), p.y()] }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| json!([p.x(), p.y()])).collect::<Vec<_>>(),
        }),
        Geometry::Line(line) => json!({
            "type": "LineString",
            "coordinates": [[line.start.x, line.start.y], [line.end.x, line.end.y]],
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": positions(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(positions).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_rings(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon_rings).collect::<Vec<_>>(),
        }),
        Geometry::Rect(r) => geometry_to_value(&Geometry::Polygon(r.to_polygon())),
        Geometry::Triangle(t) => geometry_to_value(&Geometry::Polygon(t.to_polygon())),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_to_value).collect::<Vec<_>>(),
        }),
    }
}

/// `serialize_with` helper writing an optional geometry as GeoJSON (or `null`).
pub fn serialize_geometry<S: Serializer>(geometry: &Option<Geometry<f64>>, serializer: S) -> Result<S::Ok, S::Error> {
    match geometry {
        Some(geometry) => serializer.serialize_some(&geometry_to_value(geometry)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARCELS: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4326" } },
        "features": [
            {
                "type": "Feature",
                "properties": { "gid": 7, "lr_no": " LR/123/45 ", "fr_no": "FR 9", "area": "0.25", "entity": "private" },
                "geometry": { "type": "Polygon", "coordinates": [[[36.8, -1.3], [36.801, -1.3], [36.801, -1.299], [36.8, -1.299]]] }
            },
            {
                "type": "Feature",
                "properties": { "lr_no": "LR/NO/GID" },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn reads_parcels_with_source_columns() {
        let parcels = read_parcels(PARCELS.as_bytes()).unwrap();
        assert_eq!(parcels.crs, Crs::Wgs84);
        assert_eq!(parcels.len(), 1);
        let parcel = &parcels.records[0];
        assert_eq!(parcel.gid, 7);
        assert_eq!(parcel.lr_no, "LR/123/45");
        assert_eq!(parcel.area, 0.25);
        // Ring was closed on read.
        assert_eq!(parcel.geometry.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn projected_crs_member_is_honoured() {
        let json = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "EPSG:21037" } },
            "features": [
                { "type": "Feature", "id": 3, "properties": { "label": 2 },
                  "geometry": { "type": "Point", "coordinates": [257000.0, 9856000.0] } }
            ]
        }"#;
        let entries = read_entry_points(json.as_bytes()).unwrap();
        assert_eq!(entries.crs.epsg(), Some(21037));
        assert_eq!(entries.records[0].gid, 3);
        assert_eq!(entries.records[0].label, 2);
    }

    #[test]
    fn road_attributes() {
        let json = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature",
              "properties": { "gid": 1, "name": "Ngong Rd", "fclass": "primary_link", "ref": "", "oneway": "B", "maxspeed": 0 },
              "geometry": { "type": "LineString", "coordinates": [[36.78, -1.30], [36.79, -1.30]] } }
        ] }"#;
        let roads = read_roads(json.as_bytes()).unwrap();
        let road = &roads.records[0];
        assert_eq!(road.class, RoadClass::Primary);
        assert_eq!(road.reference, None);
        assert_eq!(road.oneway, Some(false));
        assert_eq!(road.maxspeed, None);
        assert_eq!(road.geometry.0.len(), 1);
    }

    #[test]
    fn rejects_non_collections() {
        assert!(read_parcels(br#"{ "type": "Feature" }"#).is_err());
    }

    #[test]
    fn geometry_round_trips_through_value() {
        let value = json!({ "type": "MultiLineString", "coordinates": [[[1.0, 2.0], [3.0, 4.0]]] });
        let geometry = parse_geometry(&value).unwrap().unwrap();
        assert_eq!(geometry_to_value(&geometry), value);
    }
}
