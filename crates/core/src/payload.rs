//! Consensus payloads and the inventory envelope shared with the network
//! layer.

use crate::crypto::hash256;
use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::transaction::Transaction;
use crate::uint256::UInt256;
use crate::witness::Witness;

/// Opaque dBFT message relayed between validators. The ledger validates the
/// witness and forwards it; message content belongs to the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusPayload {
    pub version: u32,
    pub prev_hash: UInt256,
    pub block_index: u32,
    pub validator_index: u16,
    pub timestamp: u32,
    pub data: Vec<u8>,
    pub witness: Witness,
}

impl ConsensusPayload {
    pub fn serialize_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u32(self.version);
        self.prev_hash.serialize(writer);
        writer.write_u32(self.block_index);
        writer.write_u16(self.validator_index);
        writer.write_u32(self.timestamp);
        writer.write_var_bytes(&self.data);
    }

    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.serialize_unsigned(&mut writer);
        writer.into_bytes()
    }

    pub fn hash(&self) -> UInt256 {
        hash256(&self.unsigned_bytes())
    }

    /// Witness check over the unsigned payload bytes.
    pub fn verify_witness(&self) -> Result<bool> {
        self.witness.verify(&self.unsigned_bytes())
    }
}

impl Serializable for ConsensusPayload {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.serialize_unsigned(writer);
        writer.write_u8(1);
        self.witness.serialize(writer);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let version = reader.read_u32()?;
        let prev_hash = UInt256::deserialize(reader)?;
        let block_index = reader.read_u32()?;
        let validator_index = reader.read_u16()?;
        let timestamp = reader.read_u32()?;
        let data = reader.read_var_bytes(0x10000)?;
        if reader.read_u8()? != 1 {
            return Err(CoreError::InvalidFormat("payload witness marker".into()));
        }
        Ok(Self {
            version,
            prev_hash,
            block_index,
            validator_index,
            timestamp,
            data,
            witness: Witness::deserialize(reader)?,
        })
    }
}

/// Something relayed to peers.
#[derive(Debug, Clone)]
pub enum Inventory {
    Block(Box<crate::block::Block>),
    Transaction(Box<Transaction>),
    Consensus(Box<ConsensusPayload>),
}

impl Inventory {
    pub fn hash(&self) -> UInt256 {
        match self {
            Inventory::Block(block) => block.hash(),
            Inventory::Transaction(tx) => tx.hash(),
            Inventory::Consensus(payload) => payload.hash(),
        }
    }
}
