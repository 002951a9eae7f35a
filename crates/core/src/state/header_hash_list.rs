//! Persisted batches of consecutive header hashes.

use crate::error::Result;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint256::UInt256;

/// Number of header hashes flushed per batch.
pub const HEADER_HASH_LIST_BATCH: usize = 2000;

/// One batch of consecutive header hashes, keyed in the store by the index
/// of its first entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderHashList {
    pub hashes: Vec<UInt256>,
}

impl HeaderHashList {
    pub fn new(hashes: Vec<UInt256>) -> Self {
        Self { hashes }
    }
}

impl Serializable for HeaderHashList {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        writer.write_vec(&self.hashes);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            hashes: reader.read_vec(HEADER_HASH_LIST_BATCH as u64)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let list = HeaderHashList::new(vec![UInt256::from([1u8; 32]), UInt256::from([2u8; 32])]);
        assert_eq!(HeaderHashList::from_bytes(&list.to_bytes()).unwrap(), list);
    }
}
