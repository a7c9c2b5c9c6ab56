mod common;

use common::{at, engine};
use parcelnav::search::{AddressQuery, NearQuery};
use parcelnav::EngineError;

#[test]
fn parcel_search_is_case_insensitive_and_ordered() {
    let engine = engine();
    let codes: Vec<String> = engine.search_parcels("lr/").unwrap().into_iter().map(|p| p.lr_no).collect();
    assert_eq!(codes, ["LR/123/45", "LR/999/1"]);

    let hits = engine.search_parcels("999").unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].centroid.is_some());

    assert!(matches!(engine.search_parcels(" 9 "), Err(EngineError::InvalidInput(_))));
}

#[test]
fn parcel_listing_pages_by_gid() {
    let engine = engine();
    let first = engine.list_parcels(1, Some(1)).unwrap();
    assert_eq!(first.total, 2);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.data[0].gid, 1);

    let second = engine.list_parcels(2, Some(1)).unwrap();
    assert_eq!(second.data[0].gid, 2);
    assert!(engine.list_parcels(3, Some(1)).unwrap().data.is_empty());

    assert!(matches!(engine.list_parcels(0, None), Err(EngineError::InvalidInput(_))));
    assert!(matches!(engine.list_parcels(1, Some(5000)), Err(EngineError::InvalidInput(_))));
}

#[test]
fn address_search_by_code() {
    let query = AddressQuery { lr_no: Some("123".into()), ..AddressQuery::default() };
    let records = engine().search_addresses(&query).unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.parcel.lr_no, "LR/123/45");
    // The wider address radius picks up entry point 3 as well.
    let labels: Vec<i32> = record.entry_points.iter().map(|e| e.label).collect();
    assert_eq!(labels, [1, 2, 3]);
    assert!(record.nearby_roads.iter().all(|r| r.distance_m <= 50.0));
    assert!(record.nearby_roads.len() <= 5);
    assert_eq!(record.administrative_block.as_ref().unwrap().short_name.as_deref(), Some("KLM"));
    assert_eq!(record.short_code, "KE-ILWN71");
    assert!(record.physical_address.starts_with("EP-1, LR/123/45, off Main Rd"));
}

#[test]
fn address_search_near_a_position() {
    let engine = engine();
    let near = |x: f64, radius_m| AddressQuery {
        near: Some(NearQuery { at: at(x, 20.0), radius_m }),
        ..AddressQuery::default()
    };

    let records = engine.search_addresses(&near(1080.0, Some(100.0))).unwrap();
    assert_eq!(records.iter().map(|r| r.parcel.gid).collect::<Vec<_>>(), [2]);
    assert!(records[0].administrative_block.is_none());

    // Default radius, nearest first.
    let records = engine.search_addresses(&near(600.0, None)).unwrap();
    assert_eq!(records.iter().map(|r| r.parcel.gid).collect::<Vec<_>>(), [2, 1]);

    assert!(matches!(engine.search_addresses(&near(600.0, Some(0.0))), Err(EngineError::InvalidInput(_))));
    assert!(matches!(engine.search_addresses(&near(600.0, Some(20_000.0))), Err(EngineError::InvalidInput(_))));
}
