//! Bounded, fee-prioritized transaction pool.
//!
//! The pool is the only ledger structure touched from outside the
//! dispatcher thread: validators and RPC readers iterate it while the
//! dispatcher inserts and evicts. A read-write lock around the map keeps
//! `contains`/`try_add`/`try_remove` cheap; iteration clones a consistent
//! snapshot of the entries.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use num_bigint::BigUint;
use parking_lot::RwLock;
use tracing::debug;

use basalt_core::{Fixed8, Transaction, UInt256};

/// A pooled transaction plus the metadata eviction ordering needs.
#[derive(Debug, Clone)]
pub struct PoolItem {
    pub transaction: Arc<Transaction>,
    pub hash: UInt256,
    pub network_fee: Fixed8,
    pub size: usize,
    pub timestamp: SystemTime,
}

impl PoolItem {
    pub fn new(transaction: Transaction, network_fee: Fixed8, size: usize) -> Self {
        let hash = transaction.hash();
        Self {
            transaction: Arc::new(transaction),
            hash,
            network_fee,
            size,
            timestamp: SystemTime::now(),
        }
    }

    /// Raw fee units per serialized byte, the leading priority key.
    pub fn fee_per_byte(&self) -> i64 {
        if self.size == 0 {
            0
        } else {
            self.network_fee.raw() / self.size as i64
        }
    }

    /// Ascending priority: fee density, then absolute fee, then the hash
    /// taken as an arbitrary-precision integer.
    pub fn priority_cmp(&self, other: &PoolItem) -> Ordering {
        self.fee_per_byte()
            .cmp(&other.fee_per_byte())
            .then_with(|| self.network_fee.cmp(&other.network_fee))
            .then_with(|| {
                let this = BigUint::from_bytes_le(self.hash.as_bytes());
                let that = BigUint::from_bytes_le(other.hash.as_bytes());
                this.cmp(&that)
            })
    }
}

/// The concurrent pool. Capacity is enforced after insertion; the transient
/// overshoot is bounded by the number of concurrent writers.
#[derive(Debug)]
pub struct MemPool {
    capacity: usize,
    items: RwLock<HashMap<UInt256, PoolItem>>,
}

impl MemPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn contains(&self, hash: &UInt256) -> bool {
        self.items.read().contains_key(hash)
    }

    pub fn try_get(&self, hash: &UInt256) -> Option<PoolItem> {
        self.items.read().get(hash).cloned()
    }

    /// Inserts unless present. Capacity is enforced separately through
    /// [`MemPool::enforce_capacity`].
    pub fn try_add(&self, item: PoolItem) -> bool {
        let mut items = self.items.write();
        match items.entry(item.hash) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(item);
                true
            }
        }
    }

    pub fn try_remove(&self, hash: &UInt256) -> Option<PoolItem> {
        self.items.write().remove(hash)
    }

    /// Consistent snapshot of the pool contents.
    pub fn snapshot(&self) -> Vec<PoolItem> {
        self.items.read().values().cloned().collect()
    }

    /// Snapshot in descending priority order, the reinsertion order after a
    /// block persists.
    pub fn snapshot_descending(&self) -> Vec<PoolItem> {
        let mut items = self.snapshot();
        items.sort_by(|a, b| b.priority_cmp(a));
        items
    }

    pub fn clear(&self) -> usize {
        let mut items = self.items.write();
        let count = items.len();
        items.clear();
        count
    }

    /// Evicts the lowest-priority entries until the pool fits its capacity.
    /// Returns the evicted hashes.
    pub fn enforce_capacity(&self) -> Vec<UInt256> {
        let mut items = self.items.write();
        let excess = items.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }
        let mut ordered: Vec<PoolItem> = items.values().cloned().collect();
        ordered.sort_by(|a, b| a.priority_cmp(b));
        let evicted: Vec<UInt256> = ordered.iter().take(excess).map(|item| item.hash).collect();
        for hash in &evicted {
            items.remove(hash);
        }
        debug!(count = evicted.len(), "evicted mempool transactions");
        evicted
    }

    /// True when any pooled transaction consumes one of `inputs`.
    pub fn conflicts_with(&self, transaction: &Transaction) -> bool {
        let items = self.items.read();
        items.values().any(|item| {
            item.transaction
                .inputs
                .iter()
                .any(|input| transaction.inputs.contains(input))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_core::transaction::TransactionData;

    fn item(nonce: u32, fee_raw: i64, size: usize) -> PoolItem {
        let tx = Transaction::new(TransactionData::Miner { nonce });
        PoolItem::new(tx, Fixed8::from_raw(fee_raw), size)
    }

    #[test]
    fn add_remove_contains() {
        let pool = MemPool::new(10);
        let entry = item(1, 100, 10);
        let hash = entry.hash;
        assert!(pool.try_add(entry.clone()));
        assert!(!pool.try_add(entry));
        assert!(pool.contains(&hash));
        assert!(pool.try_remove(&hash).is_some());
        assert!(pool.try_remove(&hash).is_none());
    }

    #[test]
    fn priority_orders_by_density_then_fee_then_hash() {
        let low = item(1, 100, 100); // density 1
        let high = item(2, 1000, 100); // density 10
        assert_eq!(low.priority_cmp(&high), Ordering::Less);

        let a = item(3, 100, 10);
        let b = item(4, 200, 20); // same density 10, higher absolute fee
        assert_eq!(a.priority_cmp(&b), Ordering::Less);

        let c = item(5, 100, 10);
        let d = item(6, 100, 10); // tie broken by hash
        assert_eq!(c.priority_cmp(&d), d.priority_cmp(&c).reverse());
    }

    #[test]
    fn capacity_evicts_lowest_priority() {
        let pool = MemPool::new(3);
        let lowest = item(0, 1, 100);
        let lowest_hash = lowest.hash;
        pool.try_add(lowest);
        for nonce in 1..=3 {
            pool.try_add(item(nonce, 1000 * nonce as i64, 10));
        }
        let evicted = pool.enforce_capacity();
        assert_eq!(evicted, vec![lowest_hash]);
        assert_eq!(pool.len(), 3);
        assert!(!pool.contains(&lowest_hash));
    }

    #[test]
    fn descending_snapshot_reverses_priority() {
        let pool = MemPool::new(10);
        pool.try_add(item(1, 10, 10));
        pool.try_add(item(2, 1000, 10));
        pool.try_add(item(3, 100, 10));
        let ordered = pool.snapshot_descending();
        assert_eq!(ordered.len(), 3);
        assert!(ordered[0].network_fee >= ordered[1].network_fee);
        assert!(ordered[1].network_fee >= ordered[2].network_fee);
    }

    #[test]
    fn conflict_detection_sees_shared_inputs() {
        use basalt_core::CoinReference;
        let pool = MemPool::new(10);
        let shared = CoinReference {
            prev_hash: UInt256::from([8u8; 32]),
            prev_index: 0,
        };
        let mut tx = Transaction::new(TransactionData::Contract);
        tx.inputs.push(shared);
        pool.try_add(PoolItem::new(tx, Fixed8::ZERO, 10));

        let mut rival = Transaction::new(TransactionData::Contract);
        rival.inputs.push(shared);
        assert!(pool.conflicts_with(&rival));

        let unrelated = Transaction::new(TransactionData::Contract);
        assert!(!pool.conflicts_with(&unrelated));
    }
}
