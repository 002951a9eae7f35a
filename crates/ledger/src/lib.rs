//! The Basalt ledger engine: header chain management, a bounded
//! fee-prioritized mempool, the deterministic persist engine and the
//! single-threaded ingestion dispatcher that ties them together.

mod blockchain;
mod error;
mod genesis;
mod header_index;
mod mempool;
mod persist;
mod relay;
mod relay_cache;
mod verify;
mod vm;

pub use blockchain::{
    AllowAll, BlockchainHandle, ConsensusEvent, LedgerBuilder, LedgerEvent, PolicyFilter,
    TaskEvent,
};
pub use error::{LedgerError, Result};
pub use genesis::ChainParams;
pub use header_index::HeaderIndex;
pub use mempool::{MemPool, PoolItem};
pub use persist::apply_block;
pub use relay::RelayResultReason;
pub use relay_cache::RelayCache;
pub use verify::{network_fee, verify_block, verify_header, verify_transaction, VerifyError};
pub use vm::{
    ApplicationExecuted, ExecutionOutcome, ExecutionRequest, Notification, NullExecutor,
    ScriptExecutor, VmState,
};
