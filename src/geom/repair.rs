use geo::{Area, BooleanOps, CoordsIter, Geometry, Intersects, Line, LineString, MultiLineString, MultiPolygon, Polygon};

/// Outcome of validating one source geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    /// Usable as loaded. Lines and polygons are normalized to their multi forms.
    Valid(Geometry<f64>),
    /// Usable after a fix, with a description of what changed.
    Repaired(Geometry<f64>, String),
    /// Not usable; the record stays queryable by attribute but is not indexed.
    Excluded(String),
}

/// Validate a geometry and attempt a repair if it is malformed.
pub fn repair(geometry: Geometry<f64>) -> Repair {
    if geometry.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Repair::Excluded("non-finite coordinates".into());
    }
    if geometry.coords_count() == 0 {
        return Repair::Excluded("empty geometry".into());
    }
    match geometry {
        Geometry::LineString(ls) => repair_lines(MultiLineString::new(vec![ls])),
        Geometry::MultiLineString(mls) => repair_lines(mls),
        Geometry::Polygon(polygon) => repair_polygons(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(mp) => repair_polygons(mp),
        other => Repair::Valid(other),
    }
}

fn repair_lines(lines: MultiLineString<f64>) -> Repair {
    let total = lines.0.len();
    let kept: Vec<LineString<f64>> = lines.into_iter()
        .filter(|ls| {
            let mut coords = ls.coords();
            let first = coords.next();
            coords.any(|c| Some(c) != first)
        })
        .collect();

    match kept.len() {
        0 => Repair::Excluded("no line component has two distinct points".into()),
        n if n == total => Repair::Valid(Geometry::MultiLineString(MultiLineString::new(kept))),
        n => Repair::Repaired(
            Geometry::MultiLineString(MultiLineString::new(kept)),
            format!("dropped {} degenerate line component(s)", total - n),
        ),
    }
}

/// True if a ring is too short or collapses to a line. A zero signed area
/// alone is not enough: a figure-eight cancels out but still encloses area.
fn degenerate_ring(ring: &LineString<f64>) -> bool {
    ring.0.len() < 4 || (Polygon::new(ring.clone(), vec![]).unsigned_area() == 0.0 && !ring_self_intersects(ring))
}

/// True if two non-adjacent edges of the ring touch.
fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    let edges: Vec<Line<f64>> = ring.lines().filter(|line| line.start != line.end).collect();
    let n = edges.len();
    (0..n).any(|i| {
        (i + 2..n)
            .filter(|&j| !(i == 0 && j == n - 1))
            .any(|j| edges[i].intersects(&edges[j]))
    })
}

fn repair_polygons(polygons: MultiPolygon<f64>) -> Repair {
    let mut notes = Vec::new();
    let mut dropped_rings = 0;

    let cleaned: Vec<Polygon<f64>> = polygons.into_iter()
        .filter_map(|polygon| {
            let (exterior, interiors) = polygon.into_inner();
            if degenerate_ring(&exterior) {
                dropped_rings += 1 + interiors.len();
                return None;
            }
            let before = interiors.len();
            let interiors: Vec<_> = interiors.into_iter().filter(|ring| !degenerate_ring(ring)).collect();
            dropped_rings += before - interiors.len();
            Some(Polygon::new(exterior, interiors))
        })
        .collect();

    if cleaned.is_empty() {
        return Repair::Excluded("polygon has no ring enclosing an area".into());
    }
    if dropped_rings > 0 {
        notes.push(format!("dropped {dropped_rings} degenerate ring(s)"));
    }

    let mut multipolygon = MultiPolygon::new(cleaned);
    let self_intersecting = multipolygon.iter()
        .any(|polygon| ring_self_intersects(polygon.exterior()) || polygon.interiors().iter().any(ring_self_intersects));

    if self_intersecting {
        // A union with nothing rebuilds valid rings from the input's filled area.
        multipolygon = multipolygon.union(&MultiPolygon::new(vec![]));
        if multipolygon.0.is_empty() || multipolygon.unsigned_area() == 0.0 {
            return Repair::Excluded("self-intersecting polygon could not be repaired".into());
        }
        notes.push("resolved self-intersection".into());
    }

    let geometry = Geometry::MultiPolygon(multipolygon);
    if notes.is_empty() { Repair::Valid(geometry) } else { Repair::Repaired(geometry, notes.join("; ")) }
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point, polygon};

    use super::*;

    #[test]
    fn valid_polygon_is_normalized() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        match repair(Geometry::Polygon(square.clone())) {
            Repair::Valid(Geometry::MultiPolygon(mp)) => assert_eq!(mp.0, vec![square]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bowtie_is_repaired() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        match repair(Geometry::Polygon(bowtie)) {
            Repair::Repaired(Geometry::MultiPolygon(mp), note) => {
                assert!(note.contains("self-intersection"));
                assert!((mp.unsigned_area() - 2.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn collapsed_polygon_is_excluded() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0)];
        assert!(matches!(repair(Geometry::Polygon(sliver)), Repair::Excluded(_)));
    }

    #[test]
    fn degenerate_hole_is_dropped() {
        let with_hole = Polygon::new(
            line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0)],
            vec![line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)]],
        );
        match repair(Geometry::Polygon(with_hole)) {
            Repair::Repaired(Geometry::MultiPolygon(mp), _) => assert!(mp.0[0].interiors().is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lines_need_two_distinct_points() {
        let stub = line_string![(x: 1.0, y: 1.0), (x: 1.0, y: 1.0)];
        let road = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        assert!(matches!(repair(Geometry::LineString(stub.clone())), Repair::Excluded(_)));
        match repair(Geometry::MultiLineString(MultiLineString::new(vec![stub, road.clone()]))) {
            Repair::Repaired(Geometry::MultiLineString(mls), _) => assert_eq!(mls.0, vec![road]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_finite_points_are_excluded() {
        assert!(matches!(repair(Geometry::Point(point!(x: f64::INFINITY, y: 0.0))), Repair::Excluded(_)));
        assert!(matches!(repair(Geometry::Point(point!(x: 1.0, y: 0.0))), Repair::Valid(_)));
    }
}
