use thiserror::Error;

use crate::routing::ProviderError;

/// Errors reported by engine queries.
///
/// `UpstreamUnavailable` is only surfaced by operations that need the
/// directions provider itself; route calculation recovers from it locally.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No parcel, entry point or road at the given location or code.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed coordinates, tile indices or out-of-range parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The destination parcel has no entry point within the configured radius.
    #[error("parcel {lr_no} has no entry points")]
    NoEntryPoints { lr_no: String },

    /// The requested entry point label is not part of the parcel context.
    #[error("entry point {label} not found for parcel {lr_no}")]
    EntryPointNotFound { lr_no: String, label: i32 },

    /// No named road is available to stitch a route from or to.
    #[error("cannot find route: {0}")]
    NoRoute(String),

    /// The external directions provider failed or timed out.
    #[error("directions provider unavailable: {0}")]
    UpstreamUnavailable(#[from] ProviderError),

    /// A snapshot could not be indexed. Only raised while loading.
    #[error("index build failed: {0}")]
    IndexBuild(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
