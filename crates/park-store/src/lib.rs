pub mod doctor;
mod file;
mod memory;
pub mod sync;

use anyhow::Result;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sync::{StoreHealth, SyncOutcome, SyncReport, Synchronizer, ZoneSync};

/// Externally persisted per-zone occupancy, keyed by zone name.
///
/// This is the source of truth other readers (dashboards) see. Writes are merge
/// updates: only the `occupied` flag is touched, other fields on the document stay.
pub trait OccupancyStore {
    /// Rejects zone names this store cannot key a document by. Checked once at
    /// startup so a bad name fails the run instead of every frame.
    fn check_key(&self, _zone: &str) -> Result<()> {
        Ok(())
    }

    /// `Ok(None)` means the zone has no persisted flag yet.
    fn read(&mut self, zone: &str) -> Result<Option<bool>>;

    /// Single-document upsert; either fully applied or not at all.
    fn merge_write(&mut self, zone: &str, occupied: bool) -> Result<()>;
}

impl<S: OccupancyStore + ?Sized> OccupancyStore for Box<S> {
    fn check_key(&self, zone: &str) -> Result<()> {
        (**self).check_key(zone)
    }

    fn read(&mut self, zone: &str) -> Result<Option<bool>> {
        (**self).read(zone)
    }

    fn merge_write(&mut self, zone: &str, occupied: bool) -> Result<()> {
        (**self).merge_write(zone, occupied)
    }
}
