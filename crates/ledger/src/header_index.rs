//! In-memory header chain, the spine the block chain advances along.

use basalt_core::state::{HeaderHashList, HEADER_HASH_LIST_BATCH};
use basalt_core::UInt256;
use basalt_storage::{Snapshot, SnapshotView};
use tracing::{debug, info};

use crate::error::{LedgerError, Result};

/// Ordered hashes of every known canonical header, indexed by height.
/// A prefix of `stored_count` hashes (always a multiple of the batch size)
/// has been flushed to `HeaderHashList` entries; the suffix lives only here.
#[derive(Debug)]
pub struct HeaderIndex {
    hashes: Vec<UInt256>,
    stored_count: usize,
}

impl HeaderIndex {
    /// Rebuilds the index from the store.
    ///
    /// Recovery order: persisted hash-list batches first; failing that, the
    /// block records themselves; then the in-memory suffix is restored by
    /// walking back from the recorded header head.
    pub fn load(view: &SnapshotView) -> Result<Self> {
        let mut hashes = Vec::new();
        for (start, list) in view.header_hash_lists()? {
            if start as usize != hashes.len() {
                return Err(LedgerError::Inconsistent(format!(
                    "header hash list gap at {start}"
                )));
            }
            hashes.extend(list.hashes);
        }
        let stored_count = hashes.len();

        if hashes.is_empty() {
            // No batches were ever flushed; recover from block records.
            for state in view.block_states_by_height()? {
                if state.trimmed.index() as usize != hashes.len() {
                    break;
                }
                hashes.push(state.trimmed.hash());
            }
            if !hashes.is_empty() {
                debug!(count = hashes.len(), "recovered header index from blocks");
            }
        } else if let Some(head) = view.current_header()? {
            // Extend the flushed prefix with the un-flushed suffix by
            // walking backward from the header head.
            if head.index as usize >= stored_count {
                let mut suffix = vec![UInt256::zero(); head.index as usize - stored_count + 1];
                let mut hash = head.hash;
                for slot in suffix.iter_mut().rev() {
                    let state = view
                        .block_state(&hash)?
                        .ok_or_else(|| LedgerError::Inconsistent(format!("missing header {hash}")))?;
                    *slot = hash;
                    hash = state.trimmed.header.prev_hash;
                }
                hashes.extend(suffix);
            }
        }

        info!(height = hashes.len(), stored = stored_count, "header index loaded");
        Ok(Self {
            hashes,
            stored_count,
        })
    }

    /// Number of known headers; the next header to accept has this index.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Height of the header chain head.
    pub fn height(&self) -> Option<u32> {
        (!self.hashes.is_empty()).then(|| self.hashes.len() as u32 - 1)
    }

    pub fn get(&self, index: u32) -> Option<UInt256> {
        self.hashes.get(index as usize).copied()
    }

    /// Appends the next header hash. The caller has already validated
    /// linkage and witness at `height == len`.
    pub fn append(&mut self, hash: UInt256) {
        self.hashes.push(hash);
    }

    pub fn stored_count(&self) -> usize {
        self.stored_count
    }

    /// Writes full batches into the snapshot, advancing `stored_count`.
    pub fn flush(&mut self, snapshot: &mut Snapshot) -> Result<()> {
        while self.hashes.len() - self.stored_count >= HEADER_HASH_LIST_BATCH {
            let start = self.stored_count;
            let chunk = self.hashes[start..start + HEADER_HASH_LIST_BATCH].to_vec();
            snapshot
                .header_hash_lists
                .add(start as u32, HeaderHashList::new(chunk))?;
            self.stored_count += HEADER_HASH_LIST_BATCH;
            debug!(start, "flushed header hash batch");
        }
        Ok(())
    }
}
