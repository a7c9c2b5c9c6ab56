mod instructions;
#[cfg(feature = "directions")]
mod mapbox;
mod mode;
mod provider;
mod route;
mod router;
mod select;
mod stitch;

pub use instructions::{Instruction, InstructionKind};
#[cfg(feature = "directions")]
pub use mapbox::{MapboxDirections, TOKEN_ENV};
pub use mode::TravelMode;
pub use provider::{
    directions_with_timeout, traffic_level, Congestion, Directions, DirectionsProvider, DirectionsSegment,
    ProviderError, TrafficLevel,
};
pub use route::{Destination, Route, RouteRequest, RouteResult, RouteSegment, RouteSource};
pub use router::Router;
pub use select::{access_quality, EntryAssessment};
