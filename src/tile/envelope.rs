use std::f64::consts::PI;

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::geom::mercator::{MAX_EXTENT, MAX_LATITUDE};

/// Deepest zoom level accepted for tile requests.
pub const MAX_ZOOM: u8 = 24;

/// A `z/x/y` address in the Web Mercator tile pyramid (XYZ scheme, y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    /// Validate a tile address.
    pub fn new(z: u32, x: u32, y: u32) -> Result<Self> {
        if z > MAX_ZOOM as u32 {
            return Err(EngineError::InvalidInput(format!("zoom {z} exceeds {MAX_ZOOM}")));
        }
        let n = 1u64 << z;
        if x as u64 >= n || y as u64 >= n {
            return Err(EngineError::InvalidInput(format!("tile {z}/{x}/{y} outside the {n}x{n} grid")));
        }
        Ok(Self { z: z as u8, x, y })
    }

    /// The tile at zoom `z` containing a lon/lat position.
    pub fn containing(lon: f64, lat: f64, z: u8) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(EngineError::InvalidInput(format!("non-finite position ({lon}, {lat})")));
        }
        let n = 2.0_f64.powi(z as i32);
        let max = n - 1.0;
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max);
        let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor().clamp(0.0, max);
        Self::new(z as u32, x as u32, y as u32)
    }

    /// Width of this tile in Web Mercator meters.
    #[inline]
    pub fn size(&self) -> f64 { 2.0 * MAX_EXTENT / 2.0_f64.powi(self.z as i32) }

    /// Bounds of this tile in Web Mercator meters.
    pub fn envelope(&self) -> Rect<f64> {
        let size = self.size();
        let min_x = -MAX_EXTENT + self.x as f64 * size;
        let max_y = MAX_EXTENT - self.y as f64 * size;
        Rect::new(Coord { x: min_x, y: max_y - size }, Coord { x: min_x + size, y: max_y })
    }

    /// Convert Web Mercator meters to this tile's local grid.
    /// X grows east, Y grows south; values outside `[0, extent]` lie off the tile.
    pub fn to_local(&self, coord: Coord<f64>, extent: f64) -> (f64, f64) {
        let envelope = self.envelope();
        let size = self.size();
        (
            (coord.x - envelope.min().x) / size * extent,
            (envelope.max().y - coord.y) / size * extent,
        )
    }
}
