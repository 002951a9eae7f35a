//! Per-account balances and votes.

use std::collections::HashMap;

use crate::crypto::ECPoint;
use crate::error::Result;
use crate::fixed8::Fixed8;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint160::UInt160;
use crate::uint256::UInt256;

/// Balance sheet and vote list of one script hash.
///
/// Invariant: `balances[asset]` equals the sum of unspent outputs of that
/// asset paying to `script_hash`. The persist engine maintains it; nothing
/// else writes balances.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub script_hash: UInt160,
    pub is_frozen: bool,
    pub votes: Vec<ECPoint>,
    pub balances: HashMap<UInt256, Fixed8>,
}

impl AccountState {
    pub fn new(script_hash: UInt160) -> Self {
        Self {
            script_hash,
            is_frozen: false,
            votes: Vec::new(),
            balances: HashMap::new(),
        }
    }

    /// Balance for one asset; absent means zero.
    pub fn balance(&self, asset_id: &UInt256) -> Fixed8 {
        self.balances.get(asset_id).copied().unwrap_or(Fixed8::ZERO)
    }

    /// Applies a signed delta to one asset balance.
    pub fn adjust_balance(&mut self, asset_id: UInt256, delta: Fixed8) -> Result<()> {
        let entry = self.balances.entry(asset_id).or_insert(Fixed8::ZERO);
        *entry = entry.checked_add(delta)?;
        Ok(())
    }

    /// True when the account holds nothing and votes for nobody; such
    /// accounts need not stay in the store.
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty() && self.balances.values().all(|v| v.is_zero())
    }
}

impl Serializable for AccountState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        self.script_hash.serialize(writer);
        writer.write_bool(self.is_frozen);
        writer.write_vec(&self.votes);
        // Positive balances only, sorted by asset for a stable layout.
        let mut entries: Vec<(&UInt256, &Fixed8)> = self
            .balances
            .iter()
            .filter(|(_, value)| **value > Fixed8::ZERO)
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        writer.write_var_int(entries.len() as u64);
        for (asset_id, value) in entries {
            asset_id.serialize(writer);
            value.serialize(writer);
        }
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        let script_hash = UInt160::deserialize(reader)?;
        let is_frozen = reader.read_bool()?;
        let votes = reader.read_vec(basalt_config::MAX_VALIDATORS as u64)?;
        let count = reader.read_var_int(0xFFFF)? as usize;
        let mut balances = HashMap::with_capacity(count);
        for _ in 0..count {
            let asset_id = UInt256::deserialize(reader)?;
            let value = Fixed8::deserialize(reader)?;
            balances.insert(asset_id, value);
        }
        Ok(Self {
            script_hash,
            is_frozen,
            votes,
            balances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn adjust_balance_accumulates() {
        let mut account = AccountState::new(UInt160::from([1u8; 20]));
        let asset = UInt256::from([2u8; 32]);
        account.adjust_balance(asset, Fixed8::from_whole(5).unwrap()).unwrap();
        account.adjust_balance(asset, Fixed8::from_whole(3).unwrap()).unwrap();
        assert_eq!(account.balance(&asset), Fixed8::from_whole(8).unwrap());

        account.adjust_balance(asset, -Fixed8::from_whole(8).unwrap()).unwrap();
        assert!(account.is_empty());
    }

    #[test]
    fn round_trip_drops_zero_balances() {
        let mut account = AccountState::new(UInt160::from([3u8; 20]));
        account.votes.push(KeyPair::generate().public_key());
        account
            .adjust_balance(UInt256::from([4u8; 32]), Fixed8::ONE)
            .unwrap();
        account
            .adjust_balance(UInt256::from([5u8; 32]), Fixed8::ZERO)
            .unwrap();

        let decoded = AccountState::from_bytes(&account.to_bytes()).unwrap();
        assert_eq!(decoded.script_hash, account.script_hash);
        assert_eq!(decoded.votes, account.votes);
        assert_eq!(decoded.balances.len(), 1);
        assert_eq!(decoded.balance(&UInt256::from([4u8; 32])), Fixed8::ONE);
    }
}
