//! Protocol settings and hard-coded chain constants for the Basalt ledger.
//!
//! Everything a node operator can tune lives in [`ProtocolSettings`];
//! everything consensus-critical that must never be tuned lives in the
//! constants below.

mod settings;

pub use settings::{NetworkType, ProtocolSettings, SettingsError, SystemFees};

/// Target seconds between blocks when settings do not override it.
pub const DEFAULT_SECONDS_PER_BLOCK: u32 = 15;

/// Number of blocks between utility-token generation decrements.
pub const DECREMENT_INTERVAL: u32 = 2_000_000;

/// Hard cap on the dynamically derived validator count.
pub const MAX_VALIDATORS: usize = 1024;

/// Utility generated per block within each decrement interval, in whole
/// tokens. 22 entries; after the last interval generation stops.
pub const GENERATION_AMOUNT: [u32; 22] = [
    8, 7, 6, 5, 4, 3, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
];

/// Total governing-token supply in whole tokens.
pub const GOVERNING_TOKEN_SUPPLY: u64 = 100_000_000;

/// Genesis header consensus data and genesis miner nonce.
pub const GENESIS_NONCE: u32 = 2_083_236_893;

/// Genesis timestamp, seconds since the Unix epoch.
pub const GENESIS_TIMESTAMP: u32 = 1_468_595_301;

/// Default upper bound on mempool size.
pub const MEMPOOL_CAPACITY: usize = 50_000;
