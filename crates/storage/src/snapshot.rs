//! Transactional views over the store.
//!
//! [`Snapshot`] is the write view the persist engine mutates and commits
//! atomically. [`SnapshotView`] is the cheap read-only view handed to
//! verifiers and RPC readers; it is refreshed (swapped) after every commit.

use std::sync::Arc;

use basalt_core::state::{
    AccountState, AssetState, BlockState, ContractState, HashIndexState, HeaderHashList,
    SpentCoinState, StorageEntry, StorageEntryKey, TransactionState, UnspentCoinState,
    ValidatorState, ValidatorsCountState,
};
use basalt_core::{
    Block, CoinReference, ECPoint, Serializable, Transaction, TransactionOutput, UInt160, UInt256,
};

use crate::cache::{DataCache, UniqueCache};
use crate::error::{Result, StorageError};
use crate::store::{Store, WriteBatch};
use crate::table::{StoreKey, TablePrefix};

/// The write view: one typed cache per table plus the block being applied.
#[derive(Debug, Clone)]
pub struct Snapshot {
    store: Arc<dyn Store>,
    pub blocks: DataCache<UInt256, BlockState>,
    pub transactions: DataCache<UInt256, TransactionState>,
    pub accounts: DataCache<UInt160, AccountState>,
    pub unspent_coins: DataCache<UInt256, UnspentCoinState>,
    pub spent_coins: DataCache<UInt256, SpentCoinState>,
    pub validators: DataCache<ECPoint, ValidatorState>,
    pub assets: DataCache<UInt256, AssetState>,
    pub contracts: DataCache<UInt160, ContractState>,
    pub storages: DataCache<StorageEntryKey, StorageEntry>,
    pub header_hash_lists: DataCache<u32, HeaderHashList>,
    pub validators_count: UniqueCache<ValidatorsCountState>,
    pub block_hash_index: UniqueCache<HashIndexState>,
    pub header_hash_index: UniqueCache<HashIndexState>,
    /// The block currently being applied, visible to VM sandboxes.
    pub persisting_block: Option<Block>,
}

impl Snapshot {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            blocks: DataCache::new(store.clone(), TablePrefix::DataBlock),
            transactions: DataCache::new(store.clone(), TablePrefix::DataTransaction),
            accounts: DataCache::new(store.clone(), TablePrefix::StAccount),
            unspent_coins: DataCache::new(store.clone(), TablePrefix::StCoin),
            spent_coins: DataCache::new(store.clone(), TablePrefix::StSpentCoin),
            validators: DataCache::new(store.clone(), TablePrefix::StValidator),
            assets: DataCache::new(store.clone(), TablePrefix::StAsset),
            contracts: DataCache::new(store.clone(), TablePrefix::StContract),
            storages: DataCache::new(store.clone(), TablePrefix::StStorage),
            header_hash_lists: DataCache::new(store.clone(), TablePrefix::IxHeaderHashList),
            validators_count: UniqueCache::new(store.clone(), TablePrefix::IxValidatorsCount),
            block_hash_index: UniqueCache::new(store.clone(), TablePrefix::SysCurrentBlock),
            header_hash_index: UniqueCache::new(store.clone(), TablePrefix::SysCurrentHeader),
            store,
            persisting_block: None,
        }
    }

    /// Height of the last persisted block; `None` on an empty store.
    pub fn height(&mut self) -> Result<Option<u32>> {
        let head = self.block_hash_index.get()?;
        Ok(if head.is_unset() { None } else { Some(head.index) })
    }

    /// Height of the header chain head recorded in the store.
    pub fn header_height(&mut self) -> Result<Option<u32>> {
        let head = self.header_hash_index.get()?;
        Ok(if head.is_unset() { None } else { Some(head.index) })
    }

    /// Resolves the output a coin reference points at.
    pub fn try_get_output(&mut self, input: &CoinReference) -> Result<Option<TransactionOutput>> {
        Ok(self
            .transactions
            .try_get(&input.prev_hash)?
            .and_then(|state| {
                state
                    .transaction
                    .outputs
                    .get(input.prev_index as usize)
                    .copied()
            }))
    }

    /// Flushes every dirty entry atomically.
    pub fn commit(&mut self) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.blocks.commit(&mut batch);
        self.transactions.commit(&mut batch);
        self.accounts.commit(&mut batch);
        self.unspent_coins.commit(&mut batch);
        self.spent_coins.commit(&mut batch);
        self.validators.commit(&mut batch);
        self.assets.commit(&mut batch);
        self.contracts.commit(&mut batch);
        self.storages.commit(&mut batch);
        self.header_hash_lists.commit(&mut batch);
        self.validators_count.commit(&mut batch);
        self.block_hash_index.commit(&mut batch);
        self.header_hash_index.commit(&mut batch);
        tracing::debug!(writes = batch.len(), "committing snapshot");
        self.store.put_batch(batch)
    }

    /// Isolated deep copy for VM sandboxing: shares reads, buffers its own
    /// writes, publishes them only through [`Snapshot::merge_from`].
    pub fn clone_cache(&self) -> Snapshot {
        self.clone()
    }

    /// Replays a sandbox's writes into this snapshot.
    pub fn merge_from(&mut self, child: Snapshot) -> Result<()> {
        self.blocks.merge_from(child.blocks)?;
        self.transactions.merge_from(child.transactions)?;
        self.accounts.merge_from(child.accounts)?;
        self.unspent_coins.merge_from(child.unspent_coins)?;
        self.spent_coins.merge_from(child.spent_coins)?;
        self.validators.merge_from(child.validators)?;
        self.assets.merge_from(child.assets)?;
        self.contracts.merge_from(child.contracts)?;
        self.storages.merge_from(child.storages)?;
        self.header_hash_lists.merge_from(child.header_hash_lists)?;
        self.validators_count.merge_from(child.validators_count);
        self.block_hash_index.merge_from(child.block_hash_index);
        self.header_hash_index.merge_from(child.header_hash_index);
        Ok(())
    }
}

/// Read-only view over the committed store. All methods take `&self`; the
/// view holds no cache, so it always reflects the store contents at call
/// time. A new one is swapped in after every block commit.
#[derive(Debug, Clone)]
pub struct SnapshotView {
    store: Arc<dyn Store>,
}

impl SnapshotView {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn try_get<V: Serializable>(&self, prefix: TablePrefix, key: &[u8]) -> Result<Option<V>> {
        match self.store.try_get(&prefix.make_key(key)) {
            Some(bytes) => V::from_bytes(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn current_block(&self) -> Result<Option<HashIndexState>> {
        let head: Option<HashIndexState> = self.try_get(TablePrefix::SysCurrentBlock, &[])?;
        Ok(head.filter(|h| !h.is_unset()))
    }

    pub fn current_header(&self) -> Result<Option<HashIndexState>> {
        let head: Option<HashIndexState> = self.try_get(TablePrefix::SysCurrentHeader, &[])?;
        Ok(head.filter(|h| !h.is_unset()))
    }

    pub fn height(&self) -> Result<Option<u32>> {
        Ok(self.current_block()?.map(|h| h.index))
    }

    pub fn block_state(&self, hash: &UInt256) -> Result<Option<BlockState>> {
        self.try_get(TablePrefix::DataBlock, &hash.to_store_bytes())
    }

    /// True when a full block (not just a header record) is stored.
    pub fn contains_block(&self, hash: &UInt256) -> Result<bool> {
        Ok(self
            .block_state(hash)?
            .is_some_and(|state| state.trimmed.is_block()))
    }

    pub fn transaction_state(&self, hash: &UInt256) -> Result<Option<TransactionState>> {
        self.try_get(TablePrefix::DataTransaction, &hash.to_store_bytes())
    }

    pub fn contains_transaction(&self, hash: &UInt256) -> Result<bool> {
        Ok(self.transaction_state(hash)?.is_some())
    }

    /// Reassembles a full block from its trimmed form.
    pub fn block(&self, hash: &UInt256) -> Result<Option<Block>> {
        let Some(state) = self.block_state(hash)? else {
            return Ok(None);
        };
        if !state.trimmed.is_block() {
            return Ok(None);
        }
        let mut transactions = Vec::with_capacity(state.trimmed.hashes.len());
        for tx_hash in &state.trimmed.hashes {
            let tx_state = self
                .transaction_state(tx_hash)?
                .ok_or_else(|| StorageError::Corrupt(format!("missing tx {tx_hash}")))?;
            transactions.push(tx_state.transaction);
        }
        Ok(Some(Block {
            header: state.trimmed.header,
            transactions,
        }))
    }

    pub fn account(&self, script_hash: &UInt160) -> Result<Option<AccountState>> {
        self.try_get(TablePrefix::StAccount, &script_hash.to_store_bytes())
    }

    pub fn asset(&self, asset_id: &UInt256) -> Result<Option<AssetState>> {
        self.try_get(TablePrefix::StAsset, &asset_id.to_store_bytes())
    }

    pub fn unspent_coins(&self, tx_hash: &UInt256) -> Result<Option<UnspentCoinState>> {
        self.try_get(TablePrefix::StCoin, &tx_hash.to_store_bytes())
    }

    pub fn spent_coins(&self, tx_hash: &UInt256) -> Result<Option<SpentCoinState>> {
        self.try_get(TablePrefix::StSpentCoin, &tx_hash.to_store_bytes())
    }

    pub fn validator(&self, pubkey: &ECPoint) -> Result<Option<ValidatorState>> {
        self.try_get(TablePrefix::StValidator, &pubkey.to_store_bytes())
    }

    pub fn contract(&self, script_hash: &UInt160) -> Result<Option<ContractState>> {
        self.try_get(TablePrefix::StContract, &script_hash.to_store_bytes())
    }

    pub fn validators_count(&self) -> Result<ValidatorsCountState> {
        Ok(self
            .try_get(TablePrefix::IxValidatorsCount, &[])?
            .unwrap_or_default())
    }

    pub fn storage_entry(&self, key: &StorageEntryKey) -> Result<Option<StorageEntry>> {
        self.try_get(TablePrefix::StStorage, &key.to_store_bytes())
    }

    pub fn header_hash_list(&self, start: u32) -> Result<Option<HeaderHashList>> {
        self.try_get(TablePrefix::IxHeaderHashList, &start.to_store_bytes())
    }

    /// All persisted header hash batches in ascending start order.
    pub fn header_hash_lists(&self) -> Result<Vec<(u32, HeaderHashList)>> {
        let prefix = TablePrefix::IxHeaderHashList.make_key(&[]);
        let mut lists = Vec::new();
        for (key, bytes) in self.store.seek_prefix(&prefix) {
            let start = u32::from_store_bytes(&key[1..])?;
            let list = HeaderHashList::from_bytes(&bytes)
                .map_err(|e| StorageError::Corrupt(e.to_string()))?;
            lists.push((start, list));
        }
        Ok(lists)
    }

    /// All persisted block records ordered by height. Recovery path for
    /// stores whose header hash lists were never flushed.
    pub fn block_states_by_height(&self) -> Result<Vec<BlockState>> {
        let prefix = TablePrefix::DataBlock.make_key(&[]);
        let mut states = Vec::new();
        for (_, bytes) in self.store.seek_prefix(&prefix) {
            let state =
                BlockState::from_bytes(&bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?;
            states.push(state);
        }
        states.sort_by_key(|state| state.trimmed.index());
        Ok(states)
    }

    /// Resolves the output a coin reference points at.
    pub fn output(&self, input: &CoinReference) -> Result<Option<TransactionOutput>> {
        Ok(self.transaction_state(&input.prev_hash)?.and_then(|state| {
            state
                .transaction
                .outputs
                .get(input.prev_index as usize)
                .copied()
        }))
    }

    /// Resolves every input of a transaction, or `None` when any is unknown.
    pub fn references(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<Vec<(CoinReference, TransactionOutput)>>> {
        let mut resolved = Vec::with_capacity(transaction.inputs.len());
        for input in &transaction.inputs {
            match self.output(input)? {
                Some(output) => resolved.push((*input, output)),
                None => return Ok(None),
            }
        }
        Ok(Some(resolved))
    }

    /// True when any input is already marked spent (or its coin record is
    /// missing entirely).
    pub fn is_double_spend(&self, transaction: &Transaction) -> Result<bool> {
        for input in &transaction.inputs {
            let Some(coins) = self.unspent_coins(&input.prev_hash)? else {
                return Ok(true);
            };
            match coins.flag(input.prev_index) {
                Some(flag) if !flag.is_spent() => {}
                _ => return Ok(true),
            }
        }
        Ok(false)
    }
}
