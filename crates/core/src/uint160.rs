//! 160-bit script hash value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};

/// Length of a [`UInt160`] in bytes.
pub const UINT160_SIZE: usize = 20;

/// A 160-bit value stored little-endian; the hash of a verification script
/// and therefore the identity of an account or contract.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UInt160([u8; UINT160_SIZE]);

impl UInt160 {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; UINT160_SIZE] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidFormat(format!("UInt160 needs 20 bytes, got {}", bytes.len())))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; UINT160_SIZE] {
        &self.0
    }

    pub fn to_array(self) -> [u8; UINT160_SIZE] {
        self.0
    }
}

impl From<[u8; UINT160_SIZE]> for UInt160 {
    fn from(bytes: [u8; UINT160_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Ord for UInt160 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for UInt160 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UInt160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

impl fmt::Debug for UInt160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UInt160({self})")
    }
}

impl FromStr for UInt160 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(stripped)
            .map_err(|e| CoreError::InvalidFormat(format!("UInt160 hex: {e}")))?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }
}

impl Serializable for UInt160 {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(&self.0);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self(reader.read_exact::<UINT160_SIZE>()?))
    }

    fn size(&self) -> usize {
        UINT160_SIZE
    }
}

impl Serialize for UInt160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UInt160 {
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
        let value = UInt160::from([0x5A; 20]);
        assert_eq!(value.to_string().parse::<UInt160>().unwrap(), value);
    }

    #[test]
    fn zero_is_zero() {
        assert!(UInt160::zero().is_zero());
        assert!(!UInt160::from([1u8; 20]).is_zero());
    }

    #[test]
    fn binary_round_trip() {
        let value = UInt160::from([9u8; 20]);
        assert_eq!(UInt160::from_bytes(&value.to_bytes()).unwrap(), value);
    }
}
