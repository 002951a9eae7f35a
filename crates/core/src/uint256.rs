//! 256-bit hash value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};

/// Length of a [`UInt256`] in bytes.
pub const UINT256_SIZE: usize = 32;

/// A 256-bit value stored little-endian, displayed big-endian with a `0x`
/// prefix. Used for block, transaction and asset hashes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UInt256([u8; UINT256_SIZE]);

impl UInt256 {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; UINT256_SIZE] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidFormat(format!("UInt256 needs 32 bytes, got {}", bytes.len())))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; UINT256_SIZE] {
        &self.0
    }

    pub fn to_array(self) -> [u8; UINT256_SIZE] {
        self.0
    }
}

impl From<[u8; UINT256_SIZE]> for UInt256 {
    fn from(bytes: [u8; UINT256_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Ord for UInt256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Numeric order over the little-endian representation.
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for UInt256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UInt256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

impl fmt::Debug for UInt256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UInt256({self})")
    }
}

impl FromStr for UInt256 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(stripped)
            .map_err(|e| CoreError::InvalidFormat(format!("UInt256 hex: {e}")))?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }
}

impl Serializable for UInt256 {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(&self.0);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self(reader.read_exact::<UINT256_SIZE>()?))
    }

    fn size(&self) -> usize {
        UINT256_SIZE
    }
}

impl Serialize for UInt256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UInt256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        let value = UInt256::from([0xAB; 32]);
        let text = value.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.parse::<UInt256>().unwrap(), value);
    }

    #[test]
    fn ordering_is_numeric() {
        let mut low = [0u8; 32];
        low[0] = 0xFF; // least significant byte
        let mut high = [0u8; 32];
        high[31] = 0x01; // most significant byte
        assert!(UInt256::from(low) < UInt256::from(high));
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(UInt256::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn binary_round_trip() {
        let value = UInt256::from([7u8; 32]);
        assert_eq!(UInt256::from_bytes(&value.to_bytes()).unwrap(), value);
    }
}
