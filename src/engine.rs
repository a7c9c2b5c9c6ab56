use std::sync::Arc;

use tracing::warn;

use crate::config::EngineConfig;
use crate::context::{ContextResolver, ParcelContext};
use crate::error::Result;
use crate::routing::{Directions, DirectionsProvider, RouteRequest, RouteResult, Router, TravelMode};
use crate::search::{self, AddressQuery, AddressRecord, Page};
use crate::store::{Collections, SnapshotHandle, SnapshotStore};
use crate::tile::{TileAddress, TileEncoder};
use crate::types::{LatLng, Parcel, ParcelSummary};

/// Entry point to all queries.
///
/// Every call reads the snapshot that is current when it starts and keeps
/// using it to the end, even if a reload installs a newer one meanwhile.
pub struct Engine {
    store: SnapshotStore,
    config: EngineConfig,
    directions: Option<Arc<dyn DirectionsProvider>>,
}

impl Engine {
    /// An engine with an empty snapshot and no directions provider.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self { store: SnapshotStore::new()?, config, directions: None })
    }

    /// Use `provider` for turn-by-turn directions, falling back to local
    /// stitching whenever it fails.
    pub fn with_directions(mut self, provider: Arc<dyn DirectionsProvider>) -> Self {
        self.directions = Some(provider);
        self
    }

    #[inline] pub fn config(&self) -> &EngineConfig { &self.config }

    #[inline] pub fn has_directions(&self) -> bool { self.directions.is_some() }

    /// Index `collections` and make them the active snapshot.
    pub fn load_snapshot(&self, collections: Collections) -> Result<SnapshotHandle> {
        self.store.load(collections)
    }

    #[inline] pub fn snapshot(&self) -> SnapshotHandle { self.store.current() }

    pub fn resolve_context_at(&self, at: LatLng) -> Result<ParcelContext> {
        let snapshot = self.snapshot();
        ContextResolver::new(&snapshot, &self.config.context).resolve_by_point(at)
    }

    pub fn resolve_context_by_lr_no(&self, lr_no: &str) -> Result<ParcelContext> {
        let snapshot = self.snapshot();
        ContextResolver::new(&snapshot, &self.config.context).resolve_by_lr_no(lr_no)
    }

    pub fn resolve_context_by_gid(&self, gid: u64) -> Result<ParcelContext> {
        let snapshot = self.snapshot();
        ContextResolver::new(&snapshot, &self.config.context).resolve_by_gid(gid)
    }

    /// Parcel containing a position, without boundary slack.
    pub fn find_parcel_at(&self, at: LatLng) -> Result<Arc<Parcel>> {
        let snapshot = self.snapshot();
        ContextResolver::new(&snapshot, &self.config.context).find_parcel_at(at)
    }

    /// Vector tile of the parcels at `z/x/y`.
    ///
    /// Only a malformed address is an error; any failure while encoding is
    /// logged and yields an empty tile.
    pub fn render_tile(&self, z: u32, x: u32, y: u32) -> Result<Vec<u8>> {
        let address = TileAddress::new(z, x, y)?;
        let snapshot = self.snapshot();
        let resolver = ContextResolver::new(&snapshot, &self.config.context);
        Ok(TileEncoder::new(resolver, &self.config.tiles).encode(address).unwrap_or_else(|error| {
            warn!(z, x, y, error = %error, "tile encoding failed, serving empty tile");
            Vec::new()
        }))
    }

    /// Gzip-compressed variant of [`Engine::render_tile`].
    pub fn render_tile_gzip(&self, z: u32, x: u32, y: u32) -> Result<Vec<u8>> {
        let address = TileAddress::new(z, x, y)?;
        let snapshot = self.snapshot();
        let resolver = ContextResolver::new(&snapshot, &self.config.context);
        Ok(TileEncoder::new(resolver, &self.config.tiles).encode_gzip(address).unwrap_or_else(|error| {
            warn!(z, x, y, error = %error, "tile encoding failed, serving empty tile");
            Vec::new()
        }))
    }

    fn with_router<T>(&self, f: impl FnOnce(&Router<'_>) -> Result<T>) -> Result<T> {
        let snapshot = self.snapshot();
        let resolver = ContextResolver::new(&snapshot, &self.config.context);
        f(&Router::new(resolver, &self.config.routing, self.directions.as_ref()))
    }

    pub fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResult> {
        self.with_router(|router| router.calculate_route(request))
    }

    pub fn alternative_routes(&self, origin: LatLng, lr_no: &str, mode: TravelMode) -> Result<Vec<RouteResult>> {
        self.with_router(|router| router.alternative_routes(origin, lr_no, mode))
    }

    /// Provider directions between two positions. Fails with
    /// `UpstreamUnavailable` when no provider is configured or it fails.
    pub fn route_preview(&self, origin: LatLng, destination: LatLng, mode: TravelMode) -> Result<Directions> {
        self.with_router(|router| router.route_preview(origin, destination, mode))
    }

    pub fn search_parcels(&self, query: &str) -> Result<Vec<ParcelSummary>> {
        let snapshot = self.snapshot();
        search::search_parcels(&ContextResolver::new(&snapshot, &self.config.context), &self.config.search, query)
    }

    pub fn list_parcels(&self, page: usize, limit: Option<usize>) -> Result<Page<ParcelSummary>> {
        let snapshot = self.snapshot();
        search::list_parcels(&ContextResolver::new(&snapshot, &self.config.context), &self.config.search, page, limit)
    }

    pub fn search_addresses(&self, query: &AddressQuery) -> Result<Vec<AddressRecord>> {
        let snapshot = self.snapshot();
        search::search_addresses(&ContextResolver::new(&snapshot, &self.config.context), &self.config.search, query)
    }
}
