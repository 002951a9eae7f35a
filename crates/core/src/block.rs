//! Blocks, headers and the trimmed storage form.

use crate::crypto::hash256;
use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::merkle::merkle_root;
use crate::transaction::Transaction;
use crate::uint160::UInt160;
use crate::uint256::UInt256;
use crate::witness::Witness;

const MAX_TRANSACTIONS_PER_BLOCK: u64 = 0xFFFF;

/// Block header. The hash covers the unsigned portion; the witness carries
/// the consensus signatures binding it to `prev` header's `next_consensus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub prev_hash: UInt256,
    pub merkle_root: UInt256,
    pub timestamp: u32,
    pub index: u32,
    pub consensus_data: u64,
    pub next_consensus: UInt160,
    pub witness: Witness,
}

impl Header {
    pub fn serialize_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u32(self.version);
        self.prev_hash.serialize(writer);
        self.merkle_root.serialize(writer);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.index);
        writer.write_u64(self.consensus_data);
        self.next_consensus.serialize(writer);
    }

    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.serialize_unsigned(&mut writer);
        writer.into_bytes()
    }

    pub fn hash(&self) -> UInt256 {
        hash256(&self.unsigned_bytes())
    }
}

impl Serializable for Header {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.serialize_unsigned(writer);
        writer.write_u8(1);
        self.witness.serialize(writer);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let version = reader.read_u32()?;
        let prev_hash = UInt256::deserialize(reader)?;
        let merkle_root = UInt256::deserialize(reader)?;
        let timestamp = reader.read_u32()?;
        let index = reader.read_u32()?;
        let consensus_data = reader.read_u64()?;
        let next_consensus = UInt160::deserialize(reader)?;
        if reader.read_u8()? != 1 {
            return Err(CoreError::InvalidFormat("header witness marker".into()));
        }
        Ok(Self {
            version,
            prev_hash,
            merkle_root,
            timestamp,
            index,
            consensus_data,
            next_consensus,
            witness: Witness::deserialize(reader)?,
        })
    }
}

/// A full block: header plus transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> UInt256 {
        self.header.hash()
    }

    pub fn index(&self) -> u32 {
        self.header.index
    }

    /// Recomputes the merkle root from the carried transactions.
    pub fn computed_merkle_root(&self) -> UInt256 {
        let hashes: Vec<UInt256> = self.transactions.iter().map(Transaction::hash).collect();
        merkle_root(&hashes)
    }

    /// Header-independent structural checks: merkle root consistency and
    /// the one-leading-miner rule.
    pub fn check_structure(&self) -> Result<()> {
        if self.transactions.is_empty() {
            return Err(CoreError::InvalidFormat("block without transactions".into()));
        }
        if !self.transactions[0].is_miner() {
            return Err(CoreError::InvalidFormat("first transaction must be miner".into()));
        }
        if self.transactions[1..].iter().any(Transaction::is_miner) {
            return Err(CoreError::InvalidFormat("more than one miner transaction".into()));
        }
        if self.computed_merkle_root() != self.header.merkle_root {
            return Err(CoreError::InvalidFormat("merkle root mismatch".into()));
        }
        Ok(())
    }

    /// Storage form: header plus transaction hashes.
    pub fn trim(&self) -> TrimmedBlock {
        TrimmedBlock {
            header: self.header.clone(),
            hashes: self.transactions.iter().map(Transaction::hash).collect(),
        }
    }
}

impl Serializable for Block {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.header.serialize(writer);
        writer.write_vec(&self.transactions);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            header: Header::deserialize(reader)?,
            transactions: reader.read_vec(MAX_TRANSACTIONS_PER_BLOCK)?,
        })
    }
}

/// Header plus transaction hashes, the form blocks take at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedBlock {
    pub header: Header,
    pub hashes: Vec<UInt256>,
}

impl TrimmedBlock {
    pub fn hash(&self) -> UInt256 {
        self.header.hash()
    }

    pub fn index(&self) -> u32 {
        self.header.index
    }

    /// A header-only record, used when headers run ahead of blocks.
    pub fn from_header(header: Header) -> Self {
        Self {
            header,
            hashes: Vec::new(),
        }
    }

    /// True when this record carries transaction hashes, i.e. the full
    /// block has been persisted rather than just its header.
    pub fn is_block(&self) -> bool {
        !self.hashes.is_empty()
    }
}

impl Serializable for TrimmedBlock {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.header.serialize(writer);
        writer.write_vec(&self.hashes);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            header: Header::deserialize(reader)?,
            hashes: reader.read_vec(MAX_TRANSACTIONS_PER_BLOCK)?,
        })
    }
}
