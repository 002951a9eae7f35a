//! Copy-on-write typed caches with change tracking.

use std::collections::BTreeMap;
use std::sync::Arc;

use basalt_core::Serializable;

use crate::error::{Result, StorageError};
use crate::store::{Store, WriteBatch};
use crate::table::{StoreKey, TablePrefix};

/// Tracking state of one cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Loaded from the store, unchanged.
    None,
    /// New record, absent from the store.
    Added,
    /// Loaded from the store and modified.
    Changed,
    /// To be removed from the store on commit.
    Deleted,
    /// Cached store miss.
    NotFound,
}

#[derive(Debug, Clone)]
struct Trackable<V> {
    item: Option<V>,
    state: TrackState,
}

/// A read-your-writes cache over one table of the store.
///
/// Reads fall through to the store and are memoized; writes stay in the
/// cache until [`DataCache::commit`] drains them into a batch. Cloning the
/// cache clones the tracked entries, which is what snapshot cloning for the
/// VM sandbox builds on.
#[derive(Debug, Clone)]
pub struct DataCache<K: StoreKey, V: Serializable + Clone> {
    store: Arc<dyn Store>,
    prefix: TablePrefix,
    entries: BTreeMap<K, Trackable<V>>,
}

impl<K: StoreKey, V: Serializable + Clone> DataCache<K, V> {
    pub fn new(store: Arc<dyn Store>, prefix: TablePrefix) -> Self {
        Self {
            store,
            prefix,
            entries: BTreeMap::new(),
        }
    }

    fn load(&self, key: &K) -> Result<Option<V>> {
        match self.store.try_get(&self.prefix.make_key(&key.to_store_bytes())) {
            Some(bytes) => {
                let value =
                    V::from_bytes(&bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn ensure_cached(&mut self, key: &K) -> Result<&mut Trackable<V>> {
        if !self.entries.contains_key(key) {
            let entry = match self.load(key)? {
                Some(item) => Trackable {
                    item: Some(item),
                    state: TrackState::None,
                },
                None => Trackable {
                    item: None,
                    state: TrackState::NotFound,
                },
            };
            self.entries.insert(key.clone(), entry);
        }
        Ok(self.entries.get_mut(key).expect("entry just inserted"))
    }

    /// Reads the current value, or `None` when absent or deleted.
    pub fn try_get(&mut self, key: &K) -> Result<Option<V>> {
        let entry = self.ensure_cached(key)?;
        Ok(match entry.state {
            TrackState::Deleted | TrackState::NotFound => None,
            _ => entry.item.clone(),
        })
    }

    /// Reads a value that must exist.
    pub fn get(&mut self, key: &K) -> Result<V> {
        self.try_get(key)?.ok_or(StorageError::KeyNotFound)
    }

    pub fn contains(&mut self, key: &K) -> Result<bool> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Inserts a new entry; fails when the key is already present.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let entry = self.ensure_cached(&key)?;
        match entry.state {
            TrackState::Deleted | TrackState::NotFound => {
                let state = if entry.state == TrackState::Deleted {
                    // Existed in the store before; the net effect is a change.
                    TrackState::Changed
                } else {
                    TrackState::Added
                };
                *entry = Trackable {
                    item: Some(value),
                    state,
                };
                Ok(())
            }
            _ => Err(StorageError::AlreadyExists),
        }
    }

    /// Mutable handle to an existing entry; marks it dirty.
    pub fn get_and_change(&mut self, key: &K) -> Result<&mut V> {
        let entry = self.ensure_cached(key)?;
        match entry.state {
            TrackState::Deleted | TrackState::NotFound => Err(StorageError::KeyNotFound),
            _ => {
                if entry.state == TrackState::None {
                    entry.state = TrackState::Changed;
                }
                Ok(entry.item.as_mut().expect("live entry has item"))
            }
        }
    }

    /// Mutable handle, creating the entry through `factory` when absent.
    pub fn get_or_create(&mut self, key: &K, factory: impl FnOnce() -> V) -> Result<&mut V> {
        let entry = self.ensure_cached(key)?;
        match entry.state {
            TrackState::Deleted => {
                *entry = Trackable {
                    item: Some(factory()),
                    state: TrackState::Changed,
                };
            }
            TrackState::NotFound => {
                *entry = Trackable {
                    item: Some(factory()),
                    state: TrackState::Added,
                };
            }
            TrackState::None => entry.state = TrackState::Changed,
            TrackState::Added | TrackState::Changed => {}
        }
        Ok(entry.item.as_mut().expect("live entry has item"))
    }

    /// Marks an entry for deletion. Deleting an absent entry is a no-op.
    pub fn delete(&mut self, key: &K) -> Result<()> {
        let entry = self.ensure_cached(key)?;
        match entry.state {
            TrackState::Added => {
                // Never reached the store; forget it entirely.
                self.entries.remove(key);
            }
            TrackState::NotFound => {}
            _ => {
                entry.item = None;
                entry.state = TrackState::Deleted;
            }
        }
        Ok(())
    }

    /// Ordered iteration over the merged view of store and dirty entries.
    /// `key_prefix` filters on the leading bytes of the entity key.
    pub fn find(&mut self, key_prefix: &[u8]) -> Result<Vec<(K, V)>> {
        let full_prefix = self.prefix.make_key(key_prefix);
        let mut merged: BTreeMap<Vec<u8>, (K, V)> = BTreeMap::new();
        for (store_key, bytes) in self.store.seek_prefix(&full_prefix) {
            let entity_bytes = &store_key[1..];
            let key = K::from_store_bytes(entity_bytes)?;
            if self.entries.contains_key(&key) {
                continue; // dirty overlay wins below
            }
            let value = V::from_bytes(&bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?;
            merged.insert(entity_bytes.to_vec(), (key, value));
        }
        for (key, entry) in &self.entries {
            let entity_bytes = key.to_store_bytes();
            if !entity_bytes.starts_with(key_prefix) {
                continue;
            }
            match entry.state {
                TrackState::Deleted | TrackState::NotFound => {
                    merged.remove(&entity_bytes);
                }
                _ => {
                    let value = entry.item.clone().expect("live entry has item");
                    merged.insert(entity_bytes, (key.clone(), value));
                }
            }
        }
        Ok(merged.into_values().collect())
    }

    /// Drains dirty entries into the batch.
    pub fn commit(&self, batch: &mut WriteBatch) {
        for (key, entry) in &self.entries {
            let store_key = self.prefix.make_key(&key.to_store_bytes());
            match entry.state {
                TrackState::Added | TrackState::Changed => {
                    let value = entry.item.as_ref().expect("live entry has item");
                    batch.put(store_key, value.to_bytes());
                }
                TrackState::Deleted => batch.delete(store_key),
                TrackState::None | TrackState::NotFound => {}
            }
        }
    }

    /// Replays another cache's dirty entries into this one. Used when a VM
    /// sandbox commits its cloned snapshot back into the persisting one.
    pub fn merge_from(&mut self, other: DataCache<K, V>) -> Result<()> {
        for (key, entry) in other.entries {
            match entry.state {
                TrackState::Added | TrackState::Changed => {
                    let value = entry.item.expect("live entry has item");
                    let slot = self.get_or_create(&key, || value.clone())?;
                    *slot = value;
                }
                TrackState::Deleted => self.delete(&key)?,
                TrackState::None | TrackState::NotFound => {}
            }
        }
        Ok(())
    }

    /// Number of dirty entries, for logging.
    pub fn dirty_len(&self) -> usize {
        self.entries
            .values()
            .filter(|e| {
                matches!(
                    e.state,
                    TrackState::Added | TrackState::Changed | TrackState::Deleted
                )
            })
            .count()
    }
}

/// Cache over a single-entry table (the head pointers and the vote-count
/// histogram).
#[derive(Debug, Clone)]
pub struct UniqueCache<V: Serializable + Clone + Default> {
    store: Arc<dyn Store>,
    prefix: TablePrefix,
    entry: Option<(V, bool)>, // (value, dirty)
}

impl<V: Serializable + Clone + Default> UniqueCache<V> {
    pub fn new(store: Arc<dyn Store>, prefix: TablePrefix) -> Self {
        Self {
            store,
            prefix,
            entry: None,
        }
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.entry.is_none() {
            let value = match self.store.try_get(&self.prefix.make_key(&[])) {
                Some(bytes) => {
                    V::from_bytes(&bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?
                }
                None => V::default(),
            };
            self.entry = Some((value, false));
        }
        Ok(())
    }

    /// Reads the current value (default when never written).
    pub fn get(&mut self) -> Result<V> {
        self.ensure_loaded()?;
        Ok(self.entry.as_ref().expect("loaded").0.clone())
    }

    /// Mutable handle; marks the entry dirty.
    pub fn get_and_change(&mut self) -> Result<&mut V> {
        self.ensure_loaded()?;
        let (value, dirty) = self.entry.as_mut().expect("loaded");
        *dirty = true;
        Ok(value)
    }

    pub fn commit(&self, batch: &mut WriteBatch) {
        if let Some((value, dirty)) = &self.entry {
            if *dirty {
                batch.put(self.prefix.make_key(&[]), value.to_bytes());
            }
        }
    }

    pub fn merge_from(&mut self, other: UniqueCache<V>) {
        if let Some((value, true)) = other.entry {
            self.entry = Some((value, true));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use basalt_core::state::HashIndexState;
    use basalt_core::UInt256;

    fn cache(store: Arc<MemoryStore>) -> DataCache<UInt256, HashIndexState> {
        DataCache::new(store, TablePrefix::DataBlock)
    }

    fn key(byte: u8) -> UInt256 {
        UInt256::from([byte; 32])
    }

    #[test]
    fn add_then_get_before_commit() {
        let store = MemoryStore::new();
        let mut cache = cache(store.clone());
        cache.add(key(1), HashIndexState::new(key(9), 4)).unwrap();
        assert_eq!(cache.get(&key(1)).unwrap().index, 4);
        // Nothing hits the store until commit.
        assert!(store.is_empty());
    }

    #[test]
    fn add_existing_fails() {
        let store = MemoryStore::new();
        let mut cache = cache(store);
        cache.add(key(1), HashIndexState::default()).unwrap();
        assert!(matches!(
            cache.add(key(1), HashIndexState::default()),
            Err(StorageError::AlreadyExists)
        ));
    }

    #[test]
    fn commit_flushes_and_reloads() {
        let store = MemoryStore::new();
        let mut cache = cache(store.clone());
        cache.add(key(1), HashIndexState::new(key(8), 7)).unwrap();
        let mut batch = WriteBatch::new();
        cache.commit(&mut batch);
        store.put_batch(batch).unwrap();

        let mut fresh = DataCache::<UInt256, HashIndexState>::new(store, TablePrefix::DataBlock);
        assert_eq!(fresh.get(&key(1)).unwrap().index, 7);
    }

    #[test]
    fn delete_of_added_entry_leaves_no_trace() {
        let store = MemoryStore::new();
        let mut cache = cache(store.clone());
        cache.add(key(1), HashIndexState::default()).unwrap();
        cache.delete(&key(1)).unwrap();
        let mut batch = WriteBatch::new();
        cache.commit(&mut batch);
        assert!(batch.is_empty());
    }

    #[test]
    fn delete_of_stored_entry_commits_a_delete() {
        let store = MemoryStore::new();
        {
            let mut cache = cache(store.clone());
            cache.add(key(1), HashIndexState::default()).unwrap();
            let mut batch = WriteBatch::new();
            cache.commit(&mut batch);
            store.put_batch(batch).unwrap();
        }
        let mut cache = cache(store.clone());
        cache.delete(&key(1)).unwrap();
        assert!(cache.try_get(&key(1)).unwrap().is_none());
        let mut batch = WriteBatch::new();
        cache.commit(&mut batch);
        store.put_batch(batch).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn get_or_create_marks_dirty() {
        let store = MemoryStore::new();
        let mut cache = cache(store.clone());
        cache
            .get_or_create(&key(2), || HashIndexState::new(key(1), 1))
            .unwrap()
            .index = 5;
        let mut batch = WriteBatch::new();
        cache.commit(&mut batch);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn find_merges_dirty_over_store() {
        let store = MemoryStore::new();
        {
            let mut cache = cache(store.clone());
            cache.add(key(1), HashIndexState::new(key(1), 1)).unwrap();
            cache.add(key(2), HashIndexState::new(key(2), 2)).unwrap();
            let mut batch = WriteBatch::new();
            cache.commit(&mut batch);
            store.put_batch(batch).unwrap();
        }
        let mut cache = cache(store);
        cache.delete(&key(1)).unwrap();
        cache.add(key(3), HashIndexState::new(key(3), 3)).unwrap();
        let found = cache.find(&[]).unwrap();
        let indexes: Vec<u32> = found.iter().map(|(_, v)| v.index).collect();
        assert_eq!(indexes.len(), 2);
        assert!(indexes.contains(&2) && indexes.contains(&3));
    }

    #[test]
    fn merge_from_replays_changes() {
        let store = MemoryStore::new();
        let mut parent = cache(store.clone());
        parent.add(key(1), HashIndexState::new(key(1), 1)).unwrap();

        let mut child = parent.clone();
        child.get_and_change(&key(1)).unwrap().index = 100;
        child.add(key(2), HashIndexState::new(key(2), 2)).unwrap();

        parent.merge_from(child).unwrap();
        assert_eq!(parent.get(&key(1)).unwrap().index, 100);
        assert_eq!(parent.get(&key(2)).unwrap().index, 2);
    }

    #[test]
    fn clone_isolates_writes() {
        let store = MemoryStore::new();
        let mut parent = cache(store);
        parent.add(key(1), HashIndexState::new(key(1), 1)).unwrap();
        let mut clone = parent.clone();
        clone.get_and_change(&key(1)).unwrap().index = 50;
        assert_eq!(parent.get(&key(1)).unwrap().index, 1);
    }

    #[test]
    fn unique_cache_defaults_then_persists() {
        let store = MemoryStore::new();
        let mut cache: UniqueCache<HashIndexState> =
            UniqueCache::new(store.clone(), TablePrefix::SysCurrentBlock);
        assert!(cache.get().unwrap().is_unset());
        *cache.get_and_change().unwrap() = HashIndexState::new(key(5), 10);
        let mut batch = WriteBatch::new();
        cache.commit(&mut batch);
        store.put_batch(batch).unwrap();

        let mut fresh: UniqueCache<HashIndexState> =
            UniqueCache::new(store, TablePrefix::SysCurrentBlock);
        assert_eq!(fresh.get().unwrap().index, 10);
    }
}
