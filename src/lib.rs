#![doc = "ParcelNav public API"]
pub mod address;
pub mod config;
mod context;
mod engine;
mod error;
pub mod geom;
mod index;
pub mod io;
pub mod routing;
pub mod search;
mod store;
pub mod tile;
pub mod types;

#[doc(inline)]
pub use config::EngineConfig;

#[doc(inline)]
pub use context::{BlockMatch, BlockRelation, ContextEntryPoint, ContextResolver, NearbyRoad, ParcelContext};

#[doc(inline)]
pub use engine::Engine;

#[doc(inline)]
pub use error::{EngineError, Result};

#[doc(inline)]
pub use index::{CollectionKind, Diagnostic, DiagnosticAction, SpatialIndex};

#[doc(inline)]
pub use store::{Collection, Collections, Snapshot, SnapshotHandle, SnapshotStore};

#[doc(inline)]
pub use types::{AdminBlock, EntryPoint, LatLng, Parcel, ParcelSummary, Road, RoadClass};
