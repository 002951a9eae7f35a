//! Bounded LRU cache of recently relayed consensus payloads.

use std::collections::{HashMap, VecDeque};

use basalt_core::{ConsensusPayload, UInt256};

/// Keeps the last `capacity` payloads so peers asking for a recently
/// relayed inventory can be answered without consensus involvement.
#[derive(Debug)]
pub struct RelayCache {
    capacity: usize,
    items: HashMap<UInt256, ConsensusPayload>,
    order: VecDeque<UInt256>,
}

impl RelayCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn contains(&self, hash: &UInt256) -> bool {
        self.items.contains_key(hash)
    }

    pub fn try_get(&mut self, hash: &UInt256) -> Option<&ConsensusPayload> {
        if self.items.contains_key(hash) {
            self.touch(hash);
        }
        self.items.get(hash)
    }

    pub fn add(&mut self, payload: ConsensusPayload) {
        let hash = payload.hash();
        if self.items.insert(hash, payload).is_some() {
            self.touch(&hash);
            return;
        }
        self.order.push_back(hash);
        while self.items.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.items.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn touch(&mut self, hash: &UInt256) {
        if let Some(pos) = self.order.iter().position(|h| h == hash) {
            self.order.remove(pos);
            self.order.push_back(*hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_core::Witness;

    fn payload(index: u32) -> ConsensusPayload {
        ConsensusPayload {
            version: 0,
            prev_hash: UInt256::zero(),
            block_index: index,
            validator_index: 0,
            timestamp: 0,
            data: Vec::new(),
            witness: Witness::default(),
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut cache = RelayCache::new(2);
        let first = payload(1);
        let first_hash = first.hash();
        cache.add(first);
        cache.add(payload(2));
        cache.add(payload(3));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&first_hash));
    }

    #[test]
    fn touch_on_get_protects_entry() {
        let mut cache = RelayCache::new(2);
        let first = payload(1);
        let first_hash = first.hash();
        cache.add(first);
        cache.add(payload(2));
        assert!(cache.try_get(&first_hash).is_some());
        cache.add(payload(3));
        assert!(cache.contains(&first_hash));
    }
}
