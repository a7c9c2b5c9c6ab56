use std::f64::consts::PI;

use geo::{Coord, CoordsIter, Geometry, Intersects, Line, MultiLineString, Polygon};

use super::Metric;

/// Mean earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the mean sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * PI / 180.0;

/// Great-circle distance in meters between two lon/lat positions.
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (lat1, lat2) = (a.y.to_radians(), b.y.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.x - a.x).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Distance between two positions under the given metric.
#[inline]
pub fn point_distance(metric: Metric, a: Coord<f64>, b: Coord<f64>) -> f64 {
    match metric {
        Metric::Geodesic => haversine_m(a, b),
        Metric::Planar => (a.x - b.x).hypot(a.y - b.y),
    }
}

/// Closest point on segment `ab` to `p`, with its distance.
///
/// Geodesic segments are measured in an equirectangular frame centered on `p`,
/// which is accurate at the street-level distances the engine works with.
fn point_segment(metric: Metric, p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> (Coord<f64>, f64) {
    let (sx, sy) = match metric {
        Metric::Geodesic => (p.y.to_radians().cos() * METERS_PER_DEGREE, METERS_PER_DEGREE),
        Metric::Planar => (1.0, 1.0),
    };
    let (ax, ay) = ((a.x - p.x) * sx, (a.y - p.y) * sy);
    let (bx, by) = ((b.x - p.x) * sx, (b.y - p.y) * sy);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 { (-(ax * dx + ay * dy) / len2).clamp(0.0, 1.0) } else { 0.0 };
    let closest = Coord { x: a.x + t * (b.x - a.x), y: a.y + t * (b.y - a.y) };
    (closest, (ax + t * dx).hypot(ay + t * dy))
}

fn push_polygon(polygon: &Polygon<f64>, out: &mut Vec<Line<f64>>) {
    out.extend(polygon.exterior().lines());
    polygon.interiors().iter().for_each(|ring| out.extend(ring.lines()));
}

/// All boundary/path segments of a geometry. Points contribute none.
fn segments(geometry: &Geometry<f64>, out: &mut Vec<Line<f64>>) {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
        Geometry::Line(line) => out.push(*line),
        Geometry::LineString(ls) => out.extend(ls.lines()),
        Geometry::MultiLineString(mls) => mls.iter().for_each(|ls| out.extend(ls.lines())),
        Geometry::Polygon(polygon) => push_polygon(polygon, out),
        Geometry::MultiPolygon(mp) => mp.iter().for_each(|polygon| push_polygon(polygon, out)),
        Geometry::Rect(rect) => push_polygon(&rect.to_polygon(), out),
        Geometry::Triangle(triangle) => push_polygon(&triangle.to_polygon(), out),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| segments(g, out)),
    }
}

/// Closest point of `geometry` to `p`, with its distance in meters (or planar units).
pub fn closest_point(metric: Metric, p: Coord<f64>, geometry: &Geometry<f64>) -> Option<(Coord<f64>, f64)> {
    let mut segs = Vec::new();
    segments(geometry, &mut segs);
    let best = if segs.is_empty() {
        geometry.coords_iter()
            .map(|c| (c, point_distance(metric, p, c)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    } else {
        segs.iter()
            .map(|line| point_segment(metric, p, line.start, line.end))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    };
    best.filter(|(c, d)| d.is_finite() && c.x.is_finite() && c.y.is_finite())
}

/// Minimum distance from any vertex of `from` to the shape `to`.
fn vertex_distance(metric: Metric, from: &[Coord<f64>], to_segments: &[Line<f64>], to_vertices: &[Coord<f64>]) -> Option<f64> {
    let nearest = |p: Coord<f64>| if to_segments.is_empty() {
        to_vertices.iter().map(|&q| point_distance(metric, p, q)).min_by(f64::total_cmp)
    } else {
        to_segments.iter().map(|line| point_segment(metric, p, line.start, line.end).1).min_by(f64::total_cmp)
    };
    from.iter().filter_map(|&p| nearest(p)).min_by(f64::total_cmp)
}

/// Minimum distance between two geometries in the same coordinate system.
///
/// Returns zero when the geometries touch or overlap, and `None` when either is
/// empty or the result is not finite.
pub fn distance(metric: Metric, a: &Geometry<f64>, b: &Geometry<f64>) -> Option<f64> {
    let (verts_a, verts_b): (Vec<_>, Vec<_>) = (a.coords_iter().collect(), b.coords_iter().collect());
    if verts_a.is_empty() || verts_b.is_empty() {
        return None;
    }
    if a.intersects(b) {
        return Some(0.0);
    }
    let (mut segs_a, mut segs_b) = (Vec::new(), Vec::new());
    segments(a, &mut segs_a);
    segments(b, &mut segs_b);

    let forward = vertex_distance(metric, &verts_a, &segs_b, &verts_b);
    let backward = vertex_distance(metric, &verts_b, &segs_a, &verts_a);
    let d = match (forward, backward) {
        (Some(f), Some(b)) => f.min(b),
        (f, b) => f.or(b)?,
    };
    d.is_finite().then_some(d)
}

/// Total length of a road geometry.
pub fn line_length(metric: Metric, lines: &MultiLineString<f64>) -> f64 {
    lines.iter()
        .flat_map(|ls| ls.lines())
        .map(|line| point_distance(metric, line.start, line.end))
        .sum()
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point, polygon};

    use super::*;

    const DEG: f64 = 1.0 / METERS_PER_DEGREE;

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine_m(Coord { x: 36.8, y: -1.0 }, Coord { x: 36.8, y: -2.0 });
        assert!((d - METERS_PER_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn geodesic_point_to_segment_is_perpendicular() {
        let road = Geometry::LineString(line_string![(x: 36.8 - 0.01, y: 0.0), (x: 36.8 + 0.01, y: 0.0)]);
        let p = Geometry::Point(point!(x: 36.8, y: 10.0 * DEG));
        let d = distance(Metric::Geodesic, &p, &road).unwrap();
        assert!((d - 10.0).abs() < 1e-6, "{d}");
    }

    #[test]
    fn touching_and_contained_are_zero() {
        let square = Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)]);
        let inside = Geometry::Point(point!(x: 1.0, y: 1.0));
        let edge = Geometry::Point(point!(x: 4.0, y: 2.0));
        let outside = Geometry::Point(point!(x: 7.0, y: 8.0));
        assert_eq!(distance(Metric::Planar, &inside, &square), Some(0.0));
        assert_eq!(distance(Metric::Planar, &edge, &square), Some(0.0));
        assert_eq!(distance(Metric::Planar, &outside, &square), Some(5.0));
    }

    #[test]
    fn segment_to_segment_uses_both_directions() {
        let a = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]);
        let b = Geometry::LineString(line_string![(x: 5.0, y: 3.0), (x: 5.0, y: 30.0)]);
        assert_eq!(distance(Metric::Planar, &a, &b), Some(3.0));
        assert_eq!(distance(Metric::Planar, &b, &a), Some(3.0));
    }

    #[test]
    fn closest_point_on_line() {
        let road = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]);
        let (c, d) = closest_point(Metric::Planar, Coord { x: 3.0, y: -4.0 }, &road).unwrap();
        assert_eq!(c, Coord { x: 3.0, y: 0.0 });
        assert_eq!(d, 4.0);
    }

    #[test]
    fn non_finite_input_has_no_distance() {
        let bad = Geometry::Point(point!(x: f64::NAN, y: 0.0));
        let good = Geometry::Point(point!(x: 1.0, y: 0.0));
        assert_eq!(distance(Metric::Planar, &bad, &good), None);
    }

    #[test]
    fn line_length_sums_parts() {
        let lines = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)],
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 1.0, y: 2.0)],
        ]);
        assert_eq!(line_length(Metric::Planar, &lines), 8.0);
    }
}
