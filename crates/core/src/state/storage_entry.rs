//! Per-contract persistent storage entries.

use crate::error::Result;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::uint160::UInt160;

/// Key of one contract storage entry: owning contract plus item key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageEntryKey {
    pub script_hash: UInt160,
    pub key: Vec<u8>,
}

impl StorageEntryKey {
    pub fn new(script_hash: UInt160, key: impl Into<Vec<u8>>) -> Self {
        Self {
            script_hash,
            key: key.into(),
        }
    }
}

impl Serializable for StorageEntryKey {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.script_hash.serialize(writer);
        writer.write_var_bytes(&self.key);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            script_hash: UInt160::deserialize(reader)?,
            key: reader.read_var_bytes(1024)?,
        })
    }
}

/// Value of one contract storage entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageEntry {
    pub value: Vec<u8>,
}

impl StorageEntry {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Serializable for StorageEntry {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        writer.write_var_bytes(&self.value);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            value: reader.read_var_bytes(0xFFFF)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_and_entry_round_trip() {
        let key = StorageEntryKey::new(UInt160::from([1u8; 20]), vec![0xAA, 0xBB]);
        assert_eq!(StorageEntryKey::from_bytes(&key.to_bytes()).unwrap(), key);

        let entry = StorageEntry::new(vec![1, 2, 3]);
        assert_eq!(StorageEntry::from_bytes(&entry.to_bytes()).unwrap(), entry);
    }
}
