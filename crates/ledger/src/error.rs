//! Ledger error types.

use thiserror::Error;

/// Errors inside the ledger engine. Anything that escapes a persist step is
/// fatal: the dispatcher aborts rather than commit inconsistent state.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] basalt_core::CoreError),

    #[error(transparent)]
    Storage(#[from] basalt_storage::StorageError),

    #[error("invalid settings: {0}")]
    Settings(#[from] basalt_config::SettingsError),

    /// A persisted-state invariant does not hold.
    #[error("state inconsistency: {0}")]
    Inconsistent(String),

    /// The dispatcher has shut down and can no longer answer.
    #[error("ledger dispatcher is gone")]
    Disconnected,
}

/// Result alias used throughout the ledger crate.
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
