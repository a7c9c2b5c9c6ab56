use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self { Self { lat, lng } }

    /// Check that the position is finite and within the valid degree ranges.
    pub fn validate(self) -> Result<Self> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(EngineError::InvalidInput(format!("coordinates must be finite, got ({}, {})", self.lat, self.lng)));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(EngineError::InvalidInput(format!("latitude {} out of range", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(EngineError::InvalidInput(format!("longitude {} out of range", self.lng)));
        }
        Ok(self)
    }

    /// Point with x = longitude, y = latitude.
    #[inline]
    pub fn to_point(self) -> Point<f64> { Point::new(self.lng, self.lat) }

    #[inline]
    pub fn to_coord(self) -> Coord<f64> { Coord { x: self.lng, y: self.lat } }
}

impl From<Coord<f64>> for LatLng {
    fn from(coord: Coord<f64>) -> Self { Self { lat: coord.y, lng: coord.x } }
}

impl From<Point<f64>> for LatLng {
    fn from(point: Point<f64>) -> Self { point.0.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_uses_lon_lat_order() {
        let p = LatLng::new(-1.29, 36.82).to_point();
        assert_eq!(p.x(), 36.82);
        assert_eq!(p.y(), -1.29);
        assert_eq!(LatLng::from(p), LatLng::new(-1.29, 36.82));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(LatLng::new(91.0, 0.0).validate().is_err());
        assert!(LatLng::new(0.0, -180.5).validate().is_err());
        assert!(LatLng::new(f64::NAN, 0.0).validate().is_err());
        assert!(LatLng::new(-90.0, 180.0).validate().is_ok());
    }
}
