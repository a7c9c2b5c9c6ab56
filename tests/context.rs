mod common;

use common::{at, collections, engine, parcel};
use geo::MultiPolygon;
use parcelnav::{BlockRelation, EngineError, LatLng};

#[test]
fn point_inside_parcel_resolves_it() {
    let context = engine().resolve_context_at(at(20.0, 20.0)).unwrap();
    assert_eq!(context.parcel.lr_no, "LR/123/45");
    let centroid = context.centroid.unwrap();
    let expected = at(20.0, 20.0);
    assert!((centroid.lat - expected.lat).abs() < 1e-6);
    assert!((centroid.lng - expected.lng).abs() < 1e-6);
}

#[test]
fn boundary_and_tolerance() {
    let engine = engine();
    assert_eq!(engine.resolve_context_at(at(0.0, 20.0)).unwrap().parcel.gid, 1);
    assert_eq!(engine.resolve_context_at(at(-0.5, 20.0)).unwrap().parcel.gid, 1);
    assert!(matches!(engine.resolve_context_at(at(-2.0, 20.0)), Err(EngineError::NotFound(_))));
}

#[test]
fn strict_lookup_has_no_slack() {
    let engine = engine();
    assert_eq!(engine.find_parcel_at(at(20.0, 20.0)).unwrap().lr_no, "LR/123/45");
    assert!(matches!(engine.find_parcel_at(at(-0.5, 20.0)), Err(EngineError::NotFound(_))));
}

#[test]
fn malformed_coordinates_are_rejected() {
    let engine = engine();
    assert!(matches!(engine.resolve_context_at(LatLng::new(91.0, 36.8)), Err(EngineError::InvalidInput(_))));
    assert!(matches!(engine.resolve_context_at(LatLng::new(f64::NAN, 36.8)), Err(EngineError::InvalidInput(_))));
}

#[test]
fn entry_points_are_sorted_and_within_radius() {
    let context = engine().resolve_context_by_lr_no("LR/123/45").unwrap();
    let labels: Vec<i32> = context.entry_points.iter().map(|e| e.label).collect();
    assert_eq!(labels, [1, 2]);

    let distances: Vec<f64> = context.entry_points.iter().map(|e| e.distance_to_parcel_m).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!(distances.iter().all(|&d| d <= 5.0));
    assert!((distances[0] - 3.0).abs() < 0.05);
    assert!((distances[1] - 4.0).abs() < 0.05);
}

#[test]
fn entry_point_roads_are_named_sorted_and_near() {
    let context = engine().resolve_context_by_lr_no("LR/123/45").unwrap();

    let first = context.entry_point(1).unwrap();
    let names: Vec<&str> = first.nearest_roads.iter().map(|r| r.name.as_str()).collect();
    // The unnamed service road is closer but never listed; Link St is out of range.
    assert_eq!(names, ["Main Rd", "Off Rd"]);

    let second = context.entry_point(2).unwrap();
    assert_eq!(second.nearest_roads[0].name, "Off Rd");

    for entry in &context.entry_points {
        let distances: Vec<f64> = entry.nearest_roads.iter().map(|r| r.distance_m).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert!(distances.iter().all(|&d| d <= 50.0));
    }
}

#[test]
fn block_by_intersection_then_nearest() {
    let engine = engine();
    let inside = engine.resolve_context_by_lr_no("LR/123/45").unwrap();
    let block = inside.administrative_block.as_ref().unwrap();
    assert_eq!(block.block.name, "Kilimani");
    assert_eq!(block.relation, BlockRelation::Intersects);

    let outside = engine.resolve_context_by_lr_no("LR/999/1").unwrap();
    let block = outside.administrative_block.as_ref().unwrap();
    assert_eq!(block.block.name, "Kilimani");
    match block.relation {
        BlockRelation::Nearest { distance_m } => assert!(distance_m > 600.0 && distance_m < 800.0),
        other => panic!("expected a nearest match, got {other:?}"),
    }
    assert!(outside.entry_points.is_empty());
}

#[test]
fn parcel_without_geometry_falls_back_to_lowest_gid_block() {
    let engine = engine();
    let mut data = collections();
    let mut far_block = data.admin_blocks.records[0].clone();
    far_block.gid = 7;
    far_block.name = "Karen".into();
    data.admin_blocks.records.insert(0, far_block);
    data.parcels.records.push(parcel(4, "LR/4/4", MultiPolygon(Vec::new())));
    engine.load_snapshot(data).unwrap();

    let context = engine.resolve_context_by_lr_no("LR/4/4").unwrap();
    assert!(context.geometry.is_none());
    let block = context.administrative_block.as_ref().unwrap();
    assert_eq!(block.block.gid, 1);
    assert_eq!(block.relation, BlockRelation::Fallback);
    assert!(context.entry_points.is_empty());
}

#[test]
fn lookup_by_code_and_gid() {
    let engine = engine();
    assert_eq!(engine.resolve_context_by_lr_no("  LR/999/1 ").unwrap().parcel.gid, 2);
    assert_eq!(engine.resolve_context_by_gid(1).unwrap().parcel.lr_no, "LR/123/45");
    assert!(matches!(engine.resolve_context_by_lr_no(""), Err(EngineError::InvalidInput(_))));
    assert!(matches!(engine.resolve_context_by_lr_no("LR/0/0"), Err(EngineError::NotFound(_))));
    assert!(matches!(engine.resolve_context_by_gid(42), Err(EngineError::NotFound(_))));
}

#[test]
fn context_serializes_geometry_as_geojson() {
    let context = engine().resolve_context_by_lr_no("LR/123/45").unwrap();
    let value = serde_json::to_value(&context).unwrap();
    assert_eq!(value["geometry"]["type"], "MultiPolygon");
    assert_eq!(value["administrative_block"]["match"], "intersects");
    assert_eq!(value["entry_points"][0]["nearest_roads"][0]["name"], "Main Rd");
}
