use geo::{BoundingRect, Coord, Geometry, Intersects, Point, Rect};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use super::{distance, Metric, METERS_PER_DEGREE};

/// Bounding box of the geometry in one slot.
type SlotBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// First search radius of a nearest-neighbor query, in meters.
const INITIAL_RADIUS_M: f64 = 64.0;

/// Growth factor of the search radius between rounds.
const RADIUS_GROWTH: f64 = 4.0;

/// A candidate found by a distance query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub slot: usize,
    pub gid: u64,
    pub distance: f64,
}

/// One collection's geometries with an R-tree over their bounding boxes.
///
/// Slots line up with the owning collection's record order. A slot whose
/// geometry was excluded at load time holds `None` and is never returned.
#[derive(Debug, Clone)]
pub struct SpatialLayer {
    metric: Metric,
    ids: Vec<u64>,
    shapes: Vec<Option<Geometry<f64>>>,
    rtree: RTree<SlotBox>,
    bounds: Option<Rect<f64>>,
}

impl SpatialLayer {
    /// Construct a layer from `(gid, geometry)` pairs.
    pub fn new(metric: Metric, entries: Vec<(u64, Option<Geometry<f64>>)>) -> Self {
        let (ids, shapes): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let boxes: Vec<SlotBox> = shapes.iter().enumerate()
            .filter_map(|(slot, shape)| {
                let rect = shape.as_ref()?.bounding_rect()?;
                Some(SlotBox::new(Rectangle::from_corners(rect.min().into(), rect.max().into()), slot))
            })
            .collect();
        let rtree = RTree::bulk_load(boxes);
        let bounds = (rtree.size() > 0).then(|| {
            let envelope = rtree.root().envelope();
            Rect::new(Coord::from(envelope.lower()), Coord::from(envelope.upper()))
        });
        Self { metric, ids, shapes, rtree, bounds }
    }

    #[inline] pub fn metric(&self) -> Metric { self.metric }

    /// Number of slots, including excluded ones.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Number of indexed (non-excluded) geometries.
    #[inline] pub fn indexed(&self) -> usize { self.rtree.size() }

    #[inline] pub fn gid(&self, slot: usize) -> u64 { self.ids[slot] }

    /// Geometry at a slot, or `None` if it was excluded.
    #[inline] pub fn shape(&self, slot: usize) -> Option<&Geometry<f64>> { self.shapes.get(slot)?.as_ref() }

    /// Bounding rectangle of all indexed geometries.
    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.bounds }

    fn sort_by_gid(&self, slots: &mut [usize]) {
        slots.sort_unstable_by_key(|&slot| self.ids[slot]);
    }

    /// Slots whose bounding box intersects `rect`, ordered by gid.
    pub fn query_rect(&self, rect: Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut slots: Vec<usize> = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        self.sort_by_gid(&mut slots);
        slots
    }

    /// Slots whose geometry intersects `geometry` (boundaries included), ordered by gid.
    pub fn intersecting(&self, geometry: &Geometry<f64>) -> Vec<usize> {
        let Some(rect) = geometry.bounding_rect() else { return Vec::new() };
        self.query_rect(rect).into_iter()
            .filter(|&slot| self.shape(slot).is_some_and(|shape| shape.intersects(geometry)))
            .collect()
    }

    /// The lowest-gid geometry containing or touching `coord`.
    pub fn containing(&self, coord: Coord<f64>) -> Option<usize> {
        self.intersecting(&Geometry::Point(Point(coord))).into_iter().next()
    }

    /// Grow a rectangle by `meters` on every side.
    fn expand(&self, rect: Rect<f64>, meters: f64) -> Rect<f64> {
        match self.metric {
            Metric::Planar => Rect::new(
                Coord { x: rect.min().x - meters, y: rect.min().y - meters },
                Coord { x: rect.max().x + meters, y: rect.max().y + meters },
            ),
            Metric::Geodesic => {
                // 5% margin covers the equirectangular approximation
                let dlat = meters / METERS_PER_DEGREE * 1.05;
                let min_y = (rect.min().y - dlat).max(-90.0);
                let max_y = (rect.max().y + dlat).min(90.0);
                let cos = min_y.abs().max(max_y.abs()).to_radians().cos();
                let dlon = if cos > 1e-6 { dlat / cos } else { f64::INFINITY };
                let (min_x, max_x) = if dlon >= 180.0 {
                    (-180.0, 180.0)
                } else {
                    ((rect.min().x - dlon).max(-180.0), (rect.max().x + dlon).min(180.0))
                };
                Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
            }
        }
    }

    /// All geometries within `max_distance` of `geometry` that pass `filter`,
    /// ordered by distance then gid. An infinite distance scans every slot.
    pub fn within_distance<F>(&self, geometry: &Geometry<f64>, max_distance: f64, filter: F) -> Vec<Hit>
    where
        F: Fn(usize) -> bool,
    {
        let Some(rect) = geometry.bounding_rect() else { return Vec::new() };
        let candidates: Vec<usize> = if max_distance.is_finite() {
            self.query_rect(self.expand(rect, max_distance))
        } else {
            (0..self.len()).collect()
        };

        let mut hits: Vec<Hit> = candidates.into_iter()
            .filter(|&slot| filter(slot))
            .filter_map(|slot| {
                let d = distance(self.metric, geometry, self.shape(slot)?)?;
                (d <= max_distance).then_some(Hit { slot, gid: self.ids[slot], distance: d })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.gid.cmp(&b.gid)));
        hits
    }

    /// The `k` nearest geometries to `geometry` that pass `filter`, by
    /// distance then gid, optionally capped at `max_distance`. Without a cap
    /// the search grows outward in rings until enough candidates are found or
    /// the whole layer has been covered.
    pub fn nearest<F>(&self, geometry: &Geometry<f64>, k: usize, max_distance: Option<f64>, filter: F) -> Vec<Hit>
    where
        F: Fn(usize) -> bool,
    {
        let (Some(bounds), Some(rect)) = (self.bounds, geometry.bounding_rect()) else { return Vec::new() };
        if k == 0 {
            return Vec::new();
        }
        if let Some(max_distance) = max_distance {
            let mut hits = self.within_distance(geometry, max_distance, filter);
            hits.truncate(k);
            return hits;
        }

        let mut radius = INITIAL_RADIUS_M;
        loop {
            let envelope = self.expand(rect, radius);
            if covers(&envelope, &bounds) {
                let mut hits = self.within_distance(geometry, f64::INFINITY, &filter);
                hits.truncate(k);
                return hits;
            }
            let mut hits = self.within_distance(geometry, radius, &filter);
            if hits.len() >= k {
                hits.truncate(k);
                return hits;
            }
            radius *= RADIUS_GROWTH;
        }
    }
}

fn covers(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x && outer.min().y <= inner.min().y
        && outer.max().x >= inner.max().x && outer.max().y >= inner.max().y
}
