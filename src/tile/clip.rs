//! Parcel shapes on a tile's local grid.

use geo::orient::Direction;
use geo::{BooleanOps, Coord, LineString, MapCoords, MultiPolygon, Orient, Polygon, Rect, RemoveRepeatedPoints, Simplify};

use super::TileAddress;
use crate::config::TileConfig;

/// The integer grid of one tile: `extent` units per side, X east, Y south.
pub(super) struct TileGrid {
    address: TileAddress,
    extent: f64,
    buffer: f64,
    tolerance: f64,
}

impl TileGrid {
    pub(super) fn new(address: TileAddress, config: &TileConfig) -> Self {
        Self {
            address,
            extent: config.extent as f64,
            buffer: config.buffer as f64,
            tolerance: config.simplify_tolerance,
        }
    }

    /// The tile square grown by the buffer on every side.
    fn window(&self) -> Polygon<f64> {
        let (lo, hi) = (-self.buffer, self.extent + self.buffer);
        Rect::new(Coord { x: lo, y: lo }, Coord { x: hi, y: hi }).to_polygon()
    }

    /// Project a Web Mercator parcel onto the grid and clip it to the window.
    ///
    /// Coordinates are snapped to whole units. Rings left without area are
    /// dropped, and a polygon goes with its exterior. Exteriors come out with
    /// positive shoelace area on the grid (clockwise on screen), holes negative.
    pub(super) fn parcel_shape(&self, shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let local = shape.map_coords(|c| {
            let (x, y) = self.address.to_local(c, self.extent);
            Coord { x, y }
        });
        let polygons = local.intersection(&self.window())
            .into_iter()
            .filter_map(|polygon| self.snap(polygon))
            .collect();
        MultiPolygon::new(polygons).orient(Direction::Default)
    }

    fn snap(&self, polygon: Polygon<f64>) -> Option<Polygon<f64>> {
        let mut polygon = polygon
            .map_coords(|c| Coord { x: c.x.round(), y: c.y.round() })
            .remove_repeated_points();
        if self.tolerance > 0.0 {
            polygon = polygon.simplify(&self.tolerance);
        }
        let (exterior, interiors) = polygon.into_inner();
        let holes = interiors.into_iter().filter(encloses_area).collect();
        encloses_area(&exterior).then(|| Polygon::new(exterior, holes))
    }
}

fn encloses_area(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4 && ring.lines().map(|line| line.determinant()).sum::<f64>() != 0.0
}

/// Vertices of a closed ring without the repeated closing point.
pub(super) fn open_ring(ring: &LineString<f64>) -> impl Iterator<Item = &Coord<f64>> {
    let n = ring.0.len().saturating_sub(1);
    ring.0.iter().take(n)
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area};

    use super::*;
    use crate::geom::mercator::MAX_EXTENT;

    /// Grid over the whole world at zoom 0, one Web Mercator meter per unit.
    fn world_grid(buffer: u32) -> TileGrid {
        let extent = (2.0 * MAX_EXTENT) as u32;
        let config = TileConfig { extent, buffer, ..TileConfig::default() };
        TileGrid::new(TileAddress::new(0, 0, 0).unwrap(), &config)
    }

    /// A Web Mercator square whose grid corner sits at `(x, y)`.
    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        let (x, y) = (x - MAX_EXTENT, MAX_EXTENT - y);
        MultiPolygon::new(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y - size), (x: x, y: y - size),
        ]])
    }

    #[test]
    fn crossing_parcel_is_cut_at_the_window() {
        let shape = world_grid(0).parcel_shape(&square(-100.0, 10.0, 150.0));
        assert_eq!(shape.0.len(), 1);
        assert!(shape.iter().flat_map(|p| p.exterior().coords()).all(|c| c.x >= 0.0));
        assert!((shape.unsigned_area() - 50.0 * 150.0).abs() < 1.0);
    }

    #[test]
    fn parcel_inside_the_buffer_is_kept() {
        assert!(world_grid(0).parcel_shape(&square(-300.0, 10.0, 100.0)).0.is_empty());
        assert!(!world_grid(256).parcel_shape(&square(-300.0, 10.0, 100.0)).0.is_empty());
    }

    #[test]
    fn slivers_narrower_than_a_unit_vanish() {
        let sliver = MultiPolygon::new(vec![polygon![
            (x: -MAX_EXTENT + 10.1, y: 0.0), (x: -MAX_EXTENT + 10.2, y: 0.0),
            (x: -MAX_EXTENT + 10.2, y: 50.0), (x: -MAX_EXTENT + 10.1, y: 50.0),
        ]]);
        assert!(world_grid(0).parcel_shape(&sliver).0.is_empty());
    }

    #[test]
    fn exteriors_are_clockwise_on_screen() {
        let shape = world_grid(0).parcel_shape(&square(100.0, 100.0, 20.0));
        let ring = shape.0[0].exterior();
        let shoelace: f64 = ring.lines().map(|line| line.determinant()).sum();
        assert!(shoelace > 0.0);
        assert_eq!(open_ring(ring).count(), 4);
    }
}
