//! Persistence layer of the Basalt ledger: the [`Store`] abstraction, the
//! byte-stable table layout, typed copy-on-write caches and transactional
//! snapshots.

mod cache;
mod error;
mod snapshot;
mod store;
mod table;

pub use cache::{DataCache, TrackState, UniqueCache};
pub use error::{Result, StorageError};
pub use snapshot::{Snapshot, SnapshotView};
pub use store::{MemoryStore, Store, WriteBatch};
pub use table::{StoreKey, TablePrefix};
