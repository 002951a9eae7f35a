//! Storage error types.

use thiserror::Error;

/// Errors surfaced by the store, caches and snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key not present where it was required.
    #[error("key not found")]
    KeyNotFound,

    /// `add` on a key that already exists.
    #[error("key already exists")]
    AlreadyExists,

    /// A stored value failed to decode; the store is corrupt.
    #[error("corrupt entry: {0}")]
    Corrupt(String),

    /// Error bubbled up from core serialization.
    #[error(transparent)]
    Core(#[from] basalt_core::CoreError),
}

/// Result alias used throughout the storage crate.
pub type Result<T, E = StorageError> = std::result::Result<T, E>;
