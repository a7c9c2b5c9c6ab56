mod common;

use std::thread;

use common::{at, collections, engine, parcel};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use parcelnav::{CollectionKind, DiagnosticAction, EngineError};

fn ring(points: &[(f64, f64)]) -> LineString<f64> {
    LineString(points.iter().map(|&(x, y)| -> Coord<f64> { at(x, y).to_coord() }).collect())
}

#[test]
fn reload_swaps_snapshot_and_keeps_old_handles_alive() {
    let engine = engine();
    let before = engine.snapshot();
    assert_eq!(before.version(), 1);
    assert_eq!(before.parcels().len(), 2);

    let mut smaller = collections();
    smaller.parcels.records.retain(|p| p.gid == 1);
    let after = engine.load_snapshot(smaller).unwrap();

    assert_eq!(after.version(), 2);
    assert_eq!(engine.snapshot().version(), 2);
    assert_eq!(after.parcels().len(), 1);
    // The old handle is untouched by the reload.
    assert_eq!(before.parcels().len(), 2);
    assert!(before.slot_by_lr_no("LR/999/1").is_some());
    assert!(matches!(engine.resolve_context_by_lr_no("LR/999/1"), Err(EngineError::NotFound(_))));
}

#[test]
fn failed_build_keeps_current_snapshot() {
    let engine = engine();
    let mut broken = collections();
    for parcel in &mut broken.parcels.records {
        parcel.geometry = MultiPolygon(Vec::new());
    }
    assert!(matches!(engine.load_snapshot(broken), Err(EngineError::IndexBuild(_))));
    assert_eq!(engine.snapshot().version(), 1);
    assert!(engine.resolve_context_at(at(20.0, 20.0)).is_ok());

    // The failed build used no version number.
    assert_eq!(engine.load_snapshot(collections()).unwrap().version(), 2);
}

#[test]
fn concurrent_loads_install_in_version_order() {
    let engine = engine();
    let mut versions: Vec<u64> = thread::scope(|scope| {
        let loads: Vec<_> = (0..4).map(|_| scope.spawn(|| engine.load_snapshot(collections()).unwrap().version())).collect();
        loads.into_iter().map(|load| load.join().unwrap()).collect()
    });
    versions.sort();
    assert_eq!(versions, [2, 3, 4, 5]);
    assert_eq!(engine.snapshot().version(), 5);
}

#[test]
fn bad_records_are_repaired_or_excluded_with_diagnostics() {
    let engine = engine();
    let mut data = collections();
    let bowtie = ring(&[(2000.0, 0.0), (2040.0, 40.0), (2040.0, 0.0), (2000.0, 40.0), (2000.0, 0.0)]);
    data.parcels.records.push(parcel(3, "LR/3/3", MultiPolygon(vec![Polygon::new(bowtie, vec![])])));
    data.parcels.records.push(parcel(4, "LR/4/4", MultiPolygon(Vec::new())));
    data.parcels.records.push(parcel(5, "LR/123/45", MultiPolygon(Vec::new())));

    let snapshot = engine.load_snapshot(data).unwrap();
    let diagnostics = snapshot.diagnostics();
    let find = |gid: u64| diagnostics.iter().find(|d| d.collection == CollectionKind::Parcels && d.gid == gid);

    assert_eq!(find(3).unwrap().action, DiagnosticAction::Repaired);
    assert_eq!(find(4).unwrap().action, DiagnosticAction::Excluded);
    assert_eq!(find(5).unwrap().action, DiagnosticAction::Excluded);

    // The duplicate code keeps the first parcel.
    assert_eq!(engine.resolve_context_by_lr_no("LR/123/45").unwrap().parcel.gid, 1);
    // The repaired parcel is queryable.
    assert_eq!(engine.resolve_context_at(at(2010.0, 20.0)).unwrap().parcel.gid, 3);
    // The excluded one exists as a record but has no geometry.
    let empty = engine.resolve_context_by_lr_no("LR/4/4").unwrap();
    assert!(empty.geometry.is_none());
    assert!(empty.entry_points.is_empty());
}

#[test]
fn readers_run_while_snapshots_are_replaced() {
    let engine = engine();
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let context = engine.resolve_context_at(at(20.0, 20.0)).unwrap();
                    assert_eq!(context.parcel.lr_no, "LR/123/45");
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..5 {
                engine.load_snapshot(collections()).unwrap();
            }
        });
    });
    assert_eq!(engine.snapshot().version(), 6);
}
