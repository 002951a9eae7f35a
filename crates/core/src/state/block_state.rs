//! Stored forms of blocks and transactions.

use crate::block::TrimmedBlock;
use crate::error::Result;
use crate::fixed8::Fixed8;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::transaction::Transaction;

/// A block at rest: cumulative system fee plus the trimmed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    /// Sum of system fees of all blocks up to and including this one.
    pub system_fee_amount: Fixed8,
    pub trimmed: TrimmedBlock,
}

impl Serializable for BlockState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        self.system_fee_amount.serialize(writer);
        self.trimmed.serialize(writer);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            system_fee_amount: Fixed8::deserialize(reader)?,
            trimmed: TrimmedBlock::deserialize(reader)?,
        })
    }
}

/// A transaction at rest, annotated with its block height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionState {
    pub block_index: u32,
    pub transaction: Transaction,
}

impl Serializable for TransactionState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        writer.write_u32(self.block_index);
        self.transaction.serialize(writer);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            block_index: reader.read_u32()?,
            transaction: Transaction::deserialize(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Header;
    use crate::transaction::TransactionData;
    use crate::uint160::UInt160;
    use crate::uint256::UInt256;
    use crate::witness::Witness;

    #[test]
    fn block_state_round_trip() {
        let header = Header {
            version: 0,
            prev_hash: UInt256::zero(),
            merkle_root: UInt256::from([3u8; 32]),
            timestamp: 1,
            index: 0,
            consensus_data: 2,
            next_consensus: UInt160::zero(),
            witness: Witness::trivial(),
        };
        let state = BlockState {
            system_fee_amount: Fixed8::from_whole(30).unwrap(),
            trimmed: TrimmedBlock {
                header,
                hashes: vec![UInt256::from([4u8; 32])],
            },
        };
        assert_eq!(BlockState::from_bytes(&state.to_bytes()).unwrap(), state);
    }

    #[test]
    fn transaction_state_round_trip() {
        let state = TransactionState {
            block_index: 9,
            transaction: Transaction::new(TransactionData::Miner { nonce: 11 }),
        };
        assert_eq!(
            TransactionState::from_bytes(&state.to_bytes()).unwrap(),
            state
        );
    }
}
