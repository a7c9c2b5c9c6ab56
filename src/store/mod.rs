mod collections;
mod snapshot;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

pub use collections::{Collection, Collections};
pub use snapshot::Snapshot;

use crate::error::Result;

/// Shared, reference-counted view of one snapshot. Holding a handle keeps that
/// snapshot alive even after a newer one is installed.
pub type SnapshotHandle = Arc<Snapshot>;

/// Holds the active snapshot and swaps it atomically on reload.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<SnapshotHandle>,
}

impl SnapshotStore {
    /// A store holding an empty snapshot (version 0).
    pub fn new() -> Result<Self> {
        Ok(Self { current: RwLock::new(Arc::new(Snapshot::empty()?)) })
    }

    /// The active snapshot.
    #[inline]
    pub fn current(&self) -> SnapshotHandle { Arc::clone(&self.current.read()) }

    /// Build a snapshot from `collections` and install it. The build runs
    /// outside the lock; readers see the old snapshot until the swap.
    ///
    /// Versions are handed out under the write lock, so they follow install
    /// order and a failed build consumes none.
    pub fn load(&self, collections: Collections) -> Result<SnapshotHandle> {
        let counts = (
            collections.parcels.len(),
            collections.entry_points.len(),
            collections.roads.len(),
            collections.admin_blocks.len(),
        );
        let mut snapshot = Snapshot::build(collections)?;

        let mut current = self.current.write();
        let previous = current.version();
        snapshot.set_version(previous + 1);
        let snapshot = Arc::new(snapshot);
        *current = Arc::clone(&snapshot);
        drop(current);

        info!(
            version = snapshot.version(),
            previous,
            parcels = counts.0,
            entry_points = counts.1,
            roads = counts.2,
            admin_blocks = counts.3,
            diagnostics = snapshot.diagnostics().len(),
            "installed snapshot"
        );
        Ok(snapshot)
    }
}
