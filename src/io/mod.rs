//! Reading collections from disk and writing geometry back out.

pub mod geojson;

pub use geojson::read_collections_dir;
