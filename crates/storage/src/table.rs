//! Byte-stable key layout.
//!
//! One prefix byte per table, then the entity key bytes. Prefix values are
//! part of the on-disk format; existing stores depend on them.

use basalt_core::state::StorageEntryKey;
use basalt_core::{ECPoint, UInt160, UInt256};

use crate::error::{Result, StorageError};

/// Table selector, the first byte of every store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TablePrefix {
    DataBlock = 0x01,
    DataTransaction = 0x02,
    StAccount = 0x40,
    StCoin = 0x44,
    StSpentCoin = 0x45,
    StValidator = 0x48,
    StAsset = 0x4c,
    StContract = 0x50,
    StStorage = 0x70,
    IxHeaderHashList = 0x80,
    IxValidatorsCount = 0x90,
    SysCurrentBlock = 0xc0,
    SysCurrentHeader = 0xc1,
}

impl TablePrefix {
    pub fn make_key(self, entity_key: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + entity_key.len());
        key.push(self as u8);
        key.extend_from_slice(entity_key);
        key
    }
}

/// Entity keys that encode to store key bytes.
pub trait StoreKey: Clone + Ord {
    fn to_store_bytes(&self) -> Vec<u8>;
    fn from_store_bytes(bytes: &[u8]) -> Result<Self>;
}

impl StoreKey for UInt256 {
    fn to_store_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_store_bytes(bytes: &[u8]) -> Result<Self> {
        UInt256::from_bytes(bytes).map_err(StorageError::Core)
    }
}

impl StoreKey for UInt160 {
    fn to_store_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_store_bytes(bytes: &[u8]) -> Result<Self> {
        UInt160::from_bytes(bytes).map_err(StorageError::Core)
    }
}

impl StoreKey for ECPoint {
    fn to_store_bytes(&self) -> Vec<u8> {
        self.encoded().to_vec()
    }

    fn from_store_bytes(bytes: &[u8]) -> Result<Self> {
        ECPoint::from_encoded(bytes).map_err(StorageError::Core)
    }
}

/// Big-endian so lexicographic seek order equals numeric order; used for
/// header hash list batch indexes.
impl StoreKey for u32 {
    fn to_store_bytes(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }

    fn from_store_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 4] = bytes
            .try_into()
            .map_err(|_| StorageError::Corrupt("u32 key length".into()))?;
        Ok(u32::from_be_bytes(array))
    }
}

impl StoreKey for StorageEntryKey {
    fn to_store_bytes(&self) -> Vec<u8> {
        let mut bytes = self.script_hash.as_bytes().to_vec();
        bytes.extend_from_slice(&self.key);
        bytes
    }

    fn from_store_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 20 {
            return Err(StorageError::Corrupt("storage key too short".into()));
        }
        Ok(StorageEntryKey {
            script_hash: UInt160::from_bytes(&bytes[..20]).map_err(StorageError::Core)?,
            key: bytes[20..].to_vec(),
        })
    }
}
