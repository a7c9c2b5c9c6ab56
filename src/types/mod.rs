mod admin_block;
mod coord;
mod entry_point;
mod parcel;
mod road;

pub use admin_block::AdminBlock;
pub use coord::LatLng;
pub use entry_point::EntryPoint;
pub use parcel::{Parcel, ParcelSummary};
pub use road::{Road, RoadClass};
