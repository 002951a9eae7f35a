//! Core types of the Basalt ledger: hashes, fixed-point amounts, binary
//! serialization, crypto, scripts, blocks, transactions and the entity
//! states of the persisted state machine.

pub mod block;
pub mod crypto;
pub mod error;
pub mod fixed8;
pub mod io;
pub mod merkle;
pub mod payload;
pub mod script;
pub mod state;
pub mod transaction;
pub mod uint160;
pub mod uint256;
pub mod witness;

pub use block::{Block, Header, TrimmedBlock};
pub use crypto::{hash160, hash256, ECPoint, KeyPair};
pub use error::{CoreError, Result};
pub use fixed8::Fixed8;
pub use io::{BinaryReader, BinaryWriter, Serializable};
pub use payload::{ConsensusPayload, Inventory};
pub use transaction::{
    AssetType, CoinReference, ContractProperties, StateDescriptor, StateKind, Transaction,
    TransactionAttribute, TransactionData, TransactionOutput, TransactionType,
};
pub use uint160::UInt160;
pub use uint256::UInt256;
pub use witness::Witness;
