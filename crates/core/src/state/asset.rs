//! Registered asset metadata.

use crate::crypto::ECPoint;
use crate::error::Result;
use crate::fixed8::Fixed8;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::transaction::AssetType;
use crate::uint160::UInt160;
use crate::uint256::UInt256;

/// One entry of the asset registry, keyed by the hash of its register
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetState {
    pub asset_id: UInt256,
    pub asset_type: AssetType,
    pub name: String,
    /// Total registered supply; `-1` raw means unbounded.
    pub amount: Fixed8,
    /// Supply issued so far.
    pub available: Fixed8,
    pub precision: u8,
    pub owner: ECPoint,
    pub admin: UInt160,
    pub expiration: u32,
    pub is_frozen: bool,
}

impl AssetState {
    /// Remaining issuable supply; `None` when unbounded.
    pub fn remaining(&self) -> Option<Fixed8> {
        if self.amount == Fixed8::from_raw(-1) {
            None
        } else {
            self.amount.checked_sub(self.available).ok()
        }
    }
}

impl Serializable for AssetState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        self.asset_id.serialize(writer);
        writer.write_u8(self.asset_type as u8);
        writer.write_var_string(&self.name);
        self.amount.serialize(writer);
        self.available.serialize(writer);
        writer.write_u8(self.precision);
        self.owner.serialize(writer);
        self.admin.serialize(writer);
        writer.write_u32(self.expiration);
        writer.write_bool(self.is_frozen);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            asset_id: UInt256::deserialize(reader)?,
            asset_type: AssetType::from_u8(reader.read_u8()?)?,
            name: reader.read_var_string(1024)?,
            amount: Fixed8::deserialize(reader)?,
            available: Fixed8::deserialize(reader)?,
            precision: reader.read_u8()?,
            owner: ECPoint::deserialize(reader)?,
            admin: UInt160::deserialize(reader)?,
            expiration: reader.read_u32()?,
            is_frozen: reader.read_bool()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn sample() -> AssetState {
        AssetState {
            asset_id: UInt256::from([1u8; 32]),
            asset_type: AssetType::Token,
            name: "[{\"name\":\"Widget\"}]".into(),
            amount: Fixed8::from_whole(1000).unwrap(),
            available: Fixed8::from_whole(250).unwrap(),
            precision: 8,
            owner: KeyPair::generate().public_key(),
            admin: UInt160::from([2u8; 20]),
            expiration: 4_000_000,
            is_frozen: false,
        }
    }

    #[test]
    fn round_trip() {
        let state = sample();
        assert_eq!(AssetState::from_bytes(&state.to_bytes()).unwrap(), state);
    }

    #[test]
    fn remaining_supply() {
        let mut state = sample();
        assert_eq!(state.remaining(), Some(Fixed8::from_whole(750).unwrap()));
        state.amount = Fixed8::from_raw(-1);
        assert_eq!(state.remaining(), None);
    }
}
