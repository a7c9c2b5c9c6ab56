use std::io::Write;

use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression};
use geo::{Geometry, Intersects};
use mvt::{GeomEncoder, GeomType, Tile};
use tracing::debug;

use super::clip::{open_ring, TileGrid};
use super::TileAddress;
use crate::config::TileConfig;
use crate::context::ContextResolver;
use crate::index::CollectionKind;
use crate::types::Parcel;

/// Label prefix for parcels outside every administrative block.
pub const UNKNOWN_BLOCK: &str = "UNK";

/// `{block short code or UNK}/{lr_no after its first separator}`.
pub fn display_label(block_short: Option<&str>, parcel: &Parcel) -> String {
    format!("{}/{}", block_short.unwrap_or(UNKNOWN_BLOCK), parcel.registration_suffix())
}

/// Encodes the parcels of one snapshot into Mapbox Vector Tiles.
pub struct TileEncoder<'a> {
    resolver: ContextResolver<'a>,
    config: &'a TileConfig,
}

impl<'a> TileEncoder<'a> {
    pub fn new(resolver: ContextResolver<'a>, config: &'a TileConfig) -> Self {
        Self { resolver, config }
    }

    /// Encode the tile at `address`. Returns an empty payload when no parcel
    /// has geometry left after clipping.
    pub fn encode(&self, address: TileAddress) -> Result<Vec<u8>> {
        let snapshot = self.resolver.snapshot();
        let tiles = snapshot.index().parcel_tiles();
        let geographic = snapshot.index().layer(CollectionKind::Parcels);
        let envelope = address.envelope();
        let envelope_shape = Geometry::Polygon(envelope.to_polygon());
        let grid = TileGrid::new(address, self.config);

        let mut tile = Tile::new(self.config.extent);
        let mut layer = tile.create_layer(&self.config.layer_name);
        let mut count = 0usize;

        for slot in tiles.query_rect(envelope) {
            let Some(Geometry::MultiPolygon(shape)) = tiles.shape(slot) else { continue };
            if !shape.intersects(&envelope_shape) {
                continue;
            }

            let clipped = grid.parcel_shape(shape);
            if clipped.0.is_empty() {
                continue;
            }
            let mut geom = GeomEncoder::new(GeomType::Polygon);
            for ring in clipped.iter().flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors())) {
                for c in open_ring(ring) {
                    geom = geom.point(c.x, c.y)?;
                }
                geom = geom.complete()?;
            }

            let parcel = snapshot.parcel(slot);
            let short = geographic.shape(slot)
                .and_then(|g| self.resolver.intersecting_block(g))
                .and_then(|block| snapshot.admin_block(block).short_code().map(str::to_string));

            let mut feature = layer.into_feature(geom.encode()?);
            feature.set_id(parcel.gid);
            feature.add_tag_uint("gid", parcel.gid);
            feature.add_tag_string("lr_no", &parcel.lr_no);
            feature.add_tag_string("fr_no", &parcel.fr_no);
            feature.add_tag_string("entity", &parcel.entity);
            feature.add_tag_double("area", parcel.area);
            feature.add_tag_string("display_label", &display_label(short.as_deref(), parcel));
            layer = feature.into_layer();
            count += 1;
        }

        debug!(z = address.z, x = address.x, y = address.y, features = count, "encoded tile");
        if count == 0 {
            return Ok(Vec::new());
        }
        tile.add_layer(layer).context("failed to add parcel layer to tile")?;
        tile.to_bytes().context("failed to serialize tile")
    }

    /// Encode a tile and gzip the payload. Empty tiles stay empty.
    pub fn encode_gzip(&self, address: TileAddress) -> Result<Vec<u8>> {
        let bytes = self.encode(address)?;
        if bytes.is_empty() {
            return Ok(bytes);
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish().context("failed to compress tile")
    }
}
