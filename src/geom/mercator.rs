//! Spherical Web Mercator (EPSG:3857) in meters.

use std::f64::consts::PI;

/// Sphere radius used by Web Mercator.
pub const RADIUS: f64 = 6_378_137.0;

/// Half the width of the projected world, in meters.
pub const MAX_EXTENT: f64 = 20_037_508.342_789_244;

/// Latitude at which the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Convert longitude (degrees) to Web Mercator X (meters).
#[inline]
pub fn lon_to_x(lon: f64) -> f64 { RADIUS * lon.to_radians() }

/// Convert latitude (degrees) to Web Mercator Y (meters), clamping at the poles.
#[inline]
pub fn lat_to_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln()
}

/// Convert Web Mercator X (meters) to longitude (degrees).
#[inline]
pub fn x_to_lon(x: f64) -> f64 { (x / RADIUS).to_degrees() }

/// Convert Web Mercator Y (meters) to latitude (degrees).
#[inline]
pub fn y_to_lat(y: f64) -> f64 { (2.0 * ((y / RADIUS).exp().atan() - PI / 4.0)).to_degrees() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_corners() {
        assert!((lon_to_x(180.0) - MAX_EXTENT).abs() < 1e-6);
        assert!((lat_to_y(MAX_LATITUDE) - MAX_EXTENT).abs() < 1e-3);
        assert!((lat_to_y(89.9) - MAX_EXTENT).abs() < 1e-3);
    }

    #[test]
    fn inverse_recovers_degrees() {
        let (lon, lat) = (36.8219, -1.2921);
        assert!((x_to_lon(lon_to_x(lon)) - lon).abs() < 1e-9);
        assert!((y_to_lat(lat_to_y(lat)) - lat).abs() < 1e-9);
    }
}
