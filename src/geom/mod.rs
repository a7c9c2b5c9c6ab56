mod crs;
mod distance;
mod layer;
pub mod mercator;
mod repair;

pub use crs::{Crs, Metric, Transformer};
pub use distance::{
    closest_point, distance, haversine_m, line_length, point_distance, EARTH_RADIUS_M, METERS_PER_DEGREE,
};
pub use layer::{Hit, SpatialLayer};
pub use repair::{repair, Repair};
