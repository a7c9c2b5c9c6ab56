use crate::geom::Crs;
use crate::types::{AdminBlock, EntryPoint, Parcel, Road};

/// Records of one collection together with the coordinate system of their geometry.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    pub crs: Crs,
    pub records: Vec<T>,
}

impl<T> Collection<T> {
    pub fn new(crs: Crs, records: Vec<T>) -> Self { Self { crs, records } }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

impl<T> Default for Collection<T> {
    fn default() -> Self { Self { crs: Crs::default(), records: Vec::new() } }
}

/// Everything a snapshot is built from.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub parcels: Collection<Parcel>,
    pub entry_points: Collection<EntryPoint>,
    pub roads: Collection<Road>,
    pub admin_blocks: Collection<AdminBlock>,
}
