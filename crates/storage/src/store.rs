//! Key-value store abstraction and the in-memory backend.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

/// A batch of writes applied atomically. `None` deletes the key.
#[derive(Debug, Default)]
pub struct WriteBatch {
    pub(crate) ops: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push((key, Some(value)));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push((key, None));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The persistence backend. Implementations must make `put_batch` atomic:
/// readers observe either none or all of a batch.
pub trait Store: Send + Sync + fmt::Debug {
    fn try_get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn contains(&self, key: &[u8]) -> bool {
        self.try_get(key).is_some()
    }

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn seek_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// Applies a batch atomically.
    fn put_batch(&self, batch: WriteBatch) -> Result<()>;

    /// Single-entry write, used only by bootstrap paths.
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.put_batch(batch)
    }
}

/// Ordered in-memory store. The default backend for tests and light tooling;
/// production nodes plug a disk-backed implementation in through [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn try_get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    fn seek_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn put_batch(&self, batch: WriteBatch) -> Result<()> {
        let mut data = self.data.write();
        for (key, value) in batch.ops {
            match value {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_is_applied_in_order() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put(vec![1], vec![10]);
        batch.put(vec![1], vec![11]);
        batch.delete(vec![2]);
        store.put_batch(batch).unwrap();
        assert_eq!(store.try_get(&[1]), Some(vec![11]));
        assert!(!store.contains(&[2]));
    }

    #[test]
    fn seek_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store.put(vec![1, 3], vec![0]).unwrap();
        store.put(vec![1, 1], vec![0]).unwrap();
        store.put(vec![2, 0], vec![0]).unwrap();
        let found = store.seek_prefix(&[1]);
        assert_eq!(
            found.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>(),
            vec![vec![1, 1], vec![1, 3]]
        );
    }
}
