mod clip;
mod encoder;
mod envelope;

pub use encoder::{display_label, TileEncoder, UNKNOWN_BLOCK};
pub use envelope::{TileAddress, MAX_ZOOM};
