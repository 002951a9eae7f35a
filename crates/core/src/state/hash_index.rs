//! Current block / current header pointers.

use crate::error::Result;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint256::UInt256;

/// A `(hash, height)` pointer. Two instances exist: the persisted block
/// head and the header head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashIndexState {
    pub hash: UInt256,
    pub index: u32,
}

impl Default for HashIndexState {
    fn default() -> Self {
        Self {
            hash: UInt256::zero(),
            index: u32::MAX,
        }
    }
}

impl HashIndexState {
    pub fn new(hash: UInt256, index: u32) -> Self {
        Self { hash, index }
    }

    /// True before anything has been persisted.
    pub fn is_unset(&self) -> bool {
        self.hash.is_zero() && self.index == u32::MAX
    }
}

impl Serializable for HashIndexState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        self.hash.serialize(writer);
        writer.write_u32(self.index);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            hash: UInt256::deserialize(reader)?,
            index: reader.read_u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let state = HashIndexState::new(UInt256::from([6u8; 32]), 42);
        assert_eq!(HashIndexState::from_bytes(&state.to_bytes()).unwrap(), state);
        assert!(!state.is_unset());
        assert!(HashIndexState::default().is_unset());
    }
}
