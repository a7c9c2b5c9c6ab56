// Synthetic snapshot laid out in local meters around (-1.3, 36.8).
//
//   Parcels:      LR/123/45 square 0..40, LR/999/1 square at x 1000..1040
//   Roads:        Main Rd (residential) y=-6, Off Rd (footway) x=47,
//                 North Ave (tertiary) y=300, Link St (residential) x=-100,
//                 an unnamed service road y=-4
//   Entry points: 1 at (10,-3), 2 at (44,20), 3 at (20,50) (too far to count)
//   Admin block:  Kilimani (KLM) covering x -300..300, y -300..150
#![allow(dead_code)]

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use parcelnav::geom::{Crs, METERS_PER_DEGREE};
use parcelnav::{AdminBlock, Collection, Collections, Engine, EngineConfig, EntryPoint, LatLng, Parcel, Road, RoadClass};

pub const LAT0: f64 = -1.3;
pub const LNG0: f64 = 36.8;

/// Position `x` meters east and `y` meters north of the fixture origin.
pub fn at(x: f64, y: f64) -> LatLng {
    LatLng::new(LAT0 + y / METERS_PER_DEGREE, LNG0 + x / (METERS_PER_DEGREE * LAT0.to_radians().cos()))
}

fn coord(x: f64, y: f64) -> Coord<f64> { at(x, y).to_coord() }

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    let ring = vec![coord(x0, y0), coord(x1, y0), coord(x1, y1), coord(x0, y1), coord(x0, y0)];
    MultiPolygon(vec![Polygon::new(LineString(ring), vec![])])
}

fn line(points: &[(f64, f64)]) -> MultiLineString<f64> {
    MultiLineString(vec![LineString(points.iter().map(|&(x, y)| coord(x, y)).collect())])
}

pub fn parcel(gid: u64, lr_no: &str, geometry: MultiPolygon<f64>) -> Parcel {
    Parcel {
        gid,
        lr_no: lr_no.into(),
        fr_no: format!("FR/{gid}"),
        area: 0.16,
        entity: "private".into(),
        objectid: None,
        pas: None,
        geometry,
    }
}

pub fn road(gid: u64, name: Option<&str>, class: RoadClass, points: &[(f64, f64)]) -> Road {
    Road {
        gid,
        name: name.map(str::to_string),
        class,
        reference: None,
        osm_id: None,
        oneway: None,
        maxspeed: None,
        geometry: line(points),
    }
}

pub fn entry(gid: u64, label: i32, x: f64, y: f64) -> EntryPoint {
    EntryPoint { gid, label, geometry: Point(coord(x, y)) }
}

pub fn collections() -> Collections {
    Collections {
        parcels: Collection::new(Crs::Wgs84, vec![
            parcel(1, "LR/123/45", square(0.0, 0.0, 40.0, 40.0)),
            parcel(2, "LR/999/1", square(1000.0, 0.0, 1040.0, 40.0)),
        ]),
        entry_points: Collection::new(Crs::Wgs84, vec![
            entry(1, 1, 10.0, -3.0),
            entry(2, 2, 44.0, 20.0),
            entry(3, 3, 20.0, 50.0),
        ]),
        roads: Collection::new(Crs::Wgs84, vec![
            road(1, Some("Main Rd"), RoadClass::Residential, &[(-200.0, -6.0), (200.0, -6.0)]),
            road(2, Some("Off Rd"), RoadClass::Footway, &[(47.0, -100.0), (47.0, 200.0)]),
            road(3, Some("North Ave"), RoadClass::Tertiary, &[(-200.0, 300.0), (200.0, 300.0)]),
            road(4, Some("Link St"), RoadClass::Residential, &[(-100.0, -6.0), (-100.0, 300.0)]),
            road(5, None, RoadClass::Service, &[(0.0, -4.0), (20.0, -4.0)]),
        ]),
        admin_blocks: Collection::new(Crs::Wgs84, vec![AdminBlock {
            gid: 1,
            name: "Kilimani".into(),
            constituency: "Dagoretti North".into(),
            county: "Nairobi".into(),
            short_name: Some("KLM".into()),
            const_code: Some(275),
            geometry: square(-300.0, -300.0, 300.0, 150.0),
        }]),
    }
}

/// An engine with the fixture loaded and no directions provider.
pub fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> Engine {
    let engine = Engine::new(config).unwrap();
    engine.load_snapshot(collections()).unwrap();
    engine
}
