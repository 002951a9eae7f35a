//! Coin flags and the two coin state tables.

use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint256::UInt256;

bitflags::bitflags! {
    /// Lifecycle flags of a single output. Merging is bitwise OR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CoinState: u8 {
        const CONFIRMED = 1 << 0;
        const SPENT = 1 << 1;
        const CLAIMED = 1 << 3;
        const FROZEN = 1 << 5;
    }
}

impl CoinState {
    pub fn is_spent(self) -> bool {
        self.contains(CoinState::SPENT)
    }

    pub fn is_claimed(self) -> bool {
        self.contains(CoinState::CLAIMED)
    }
}

/// Per-transaction array of coin flags, parallel to its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentCoinState {
    pub items: Vec<CoinState>,
}

impl UnspentCoinState {
    /// Fresh state for a newly confirmed transaction.
    pub fn confirmed(output_count: usize) -> Self {
        Self {
            items: vec![CoinState::CONFIRMED; output_count],
        }
    }

    pub fn flag(&self, index: u16) -> Option<CoinState> {
        self.items.get(index as usize).copied()
    }

    /// True when every output has been spent.
    pub fn fully_spent(&self) -> bool {
        self.items.iter().all(|flag| flag.is_spent())
    }
}

impl Serializable for UnspentCoinState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0); // state version
        writer.write_var_int(self.items.len() as u64);
        for flag in &self.items {
            writer.write_u8(flag.bits());
        }
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        let count = reader.read_var_int(0xFFFF)? as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let bits = reader.read_u8()?;
            items.push(
                CoinState::from_bits(bits)
                    .ok_or_else(|| CoreError::InvalidFormat(format!("coin flags 0x{bits:02x}")))?,
            );
        }
        Ok(Self { items })
    }
}

/// Governing-asset outputs of one transaction that have been spent but not
/// yet claimed: output index → height of the spending block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpentCoinState {
    pub transaction_hash: UInt256,
    pub transaction_height: u32,
    /// Sorted by output index for a stable byte layout.
    pub items: Vec<(u16, u32)>,
}

impl SpentCoinState {
    pub fn new(transaction_hash: UInt256, transaction_height: u32) -> Self {
        Self {
            transaction_hash,
            transaction_height,
            items: Vec::new(),
        }
    }

    pub fn record_spend(&mut self, output_index: u16, spent_height: u32) {
        match self.items.binary_search_by_key(&output_index, |(i, _)| *i) {
            Ok(pos) => self.items[pos].1 = spent_height,
            Err(pos) => self.items.insert(pos, (output_index, spent_height)),
        }
    }

    pub fn spent_height(&self, output_index: u16) -> Option<u32> {
        self.items
            .binary_search_by_key(&output_index, |(i, _)| *i)
            .ok()
            .map(|pos| self.items[pos].1)
    }

    pub fn remove(&mut self, output_index: u16) -> Option<u32> {
        self.items
            .binary_search_by_key(&output_index, |(i, _)| *i)
            .ok()
            .map(|pos| self.items.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Serializable for SpentCoinState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        self.transaction_hash.serialize(writer);
        writer.write_u32(self.transaction_height);
        writer.write_var_int(self.items.len() as u64);
        for (index, height) in &self.items {
            writer.write_u16(*index);
            writer.write_u32(*height);
        }
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        let transaction_hash = UInt256::deserialize(reader)?;
        let transaction_height = reader.read_u32()?;
        let count = reader.read_var_int(0xFFFF)? as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let index = reader.read_u16()?;
            let height = reader.read_u32()?;
            items.push((index, height));
        }
        Ok(Self {
            transaction_hash,
            transaction_height,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_merge_by_or() {
        let merged = CoinState::CONFIRMED | CoinState::SPENT;
        assert!(merged.is_spent());
        assert!(!merged.is_claimed());
    }

    #[test]
    fn unspent_round_trip() {
        let mut state = UnspentCoinState::confirmed(3);
        state.items[1] |= CoinState::SPENT;
        assert_eq!(
            UnspentCoinState::from_bytes(&state.to_bytes()).unwrap(),
            state
        );
        assert!(!state.fully_spent());
    }

    #[test]
    fn spent_coin_records_sorted() {
        let mut state = SpentCoinState::new(UInt256::from([1u8; 32]), 10);
        state.record_spend(5, 100);
        state.record_spend(2, 90);
        assert_eq!(state.items, vec![(2, 90), (5, 100)]);
        assert_eq!(state.spent_height(5), Some(100));
        assert_eq!(state.remove(2), Some(90));
        assert_eq!(state.spent_height(2), None);
    }

    #[test]
    fn spent_coin_round_trip() {
        let mut state = SpentCoinState::new(UInt256::from([2u8; 32]), 7);
        state.record_spend(0, 8);
        assert_eq!(SpentCoinState::from_bytes(&state.to_bytes()).unwrap(), state);
    }
}
