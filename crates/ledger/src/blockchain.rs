//! The ingestion dispatcher: a single-threaded message loop owning all
//! non-mempool ledger state.
//!
//! One tokio task runs [`Blockchain::run`]; everything else talks to it
//! through [`BlockchainHandle`]. Two unbounded queues implement the
//! priority mailbox: headers, blocks and consensus payloads preempt
//! transactions and subscriptions. Replies travel back over oneshots as
//! [`RelayResultReason`]; nothing throws across the message boundary.
//!
//! Persist failures are different: an inconsistency discovered while a
//! block is half-applied means the store can no longer be trusted, so the
//! dispatcher logs and aborts instead of committing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use basalt_config::ProtocolSettings;
use basalt_core::state::{BlockState, HashIndexState};
use basalt_core::{
    Block, ConsensusPayload, Fixed8, Header, Inventory, Serializable, Transaction, TrimmedBlock,
    UInt256,
};
use basalt_storage::{Snapshot, SnapshotView, Store};

use crate::error::{LedgerError, Result};
use crate::genesis::ChainParams;
use crate::header_index::HeaderIndex;
use crate::mempool::{MemPool, PoolItem};
use crate::persist::apply_block;
use crate::relay::RelayResultReason;
use crate::relay_cache::RelayCache;
use crate::verify::{self, VerifyError};
use crate::vm::{ApplicationExecuted, NullExecutor, ScriptExecutor};

/// Blocks are relayed to peers only while the node is near the header tip.
const RELAY_PROXIMITY: u32 = 100;

/// Consensus payloads kept for re-serving recently relayed inventories.
const RELAY_CACHE_CAPACITY: usize = 100;

/// Events distributed to registered subscribers.
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    /// A block was committed; mempool and caches are already updated.
    PersistCompleted { block: Arc<Block> },
    /// An invocation transaction finished executing.
    ApplicationExecuted(Arc<ApplicationExecuted>),
}

/// Notification to the header task manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    HeaderTaskCompleted,
}

/// Messages forwarded to an attached consensus engine.
#[derive(Debug, Clone)]
pub enum ConsensusEvent {
    Payload(Arc<ConsensusPayload>),
    PersistCompleted { block: Arc<Block> },
}

/// Plugin hook consulted before a transaction enters the mempool.
pub trait PolicyFilter: Send + Sync {
    fn check(&self, transaction: &Transaction, view: &SnapshotView) -> bool;
}

/// Default policy: everything passes.
#[derive(Debug, Default)]
pub struct AllowAll;

impl PolicyFilter for AllowAll {
    fn check(&self, _transaction: &Transaction, _view: &SnapshotView) -> bool {
        true
    }
}

enum HighPriority {
    Headers(Vec<Header>, Option<oneshot::Sender<()>>),
    Block(Box<Block>, Option<oneshot::Sender<RelayResultReason>>),
    Consensus(Box<ConsensusPayload>, Option<oneshot::Sender<RelayResultReason>>),
    Stop,
}

enum NormalPriority {
    Transaction(Box<Transaction>, Option<oneshot::Sender<RelayResultReason>>),
    Import {
        blocks: Vec<Block>,
        reply: oneshot::Sender<std::result::Result<u32, RelayResultReason>>,
    },
    Register(mpsc::UnboundedSender<LedgerEvent>),
}

/// Wires a [`Blockchain`] actor together. The ledger takes its collaborators
/// by injection; there is no process-wide instance.
pub struct LedgerBuilder {
    store: Arc<dyn Store>,
    settings: ProtocolSettings,
    executor: Arc<dyn ScriptExecutor>,
    policy: Arc<dyn PolicyFilter>,
    relay_out: Option<mpsc::UnboundedSender<Inventory>>,
    task_out: Option<mpsc::UnboundedSender<TaskEvent>>,
    consensus_out: Option<mpsc::UnboundedSender<ConsensusEvent>>,
}

impl LedgerBuilder {
    pub fn new(store: Arc<dyn Store>, settings: ProtocolSettings) -> Self {
        Self {
            store,
            settings,
            executor: Arc::new(NullExecutor),
            policy: Arc::new(AllowAll),
            relay_out: None,
            task_out: None,
            consensus_out: None,
        }
    }

    pub fn executor(mut self, executor: Arc<dyn ScriptExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn policy(mut self, policy: Arc<dyn PolicyFilter>) -> Self {
        self.policy = policy;
        self
    }

    /// Channel receiving `RelayDirectly` inventories for the local node.
    pub fn relay_target(mut self, sender: mpsc::UnboundedSender<Inventory>) -> Self {
        self.relay_out = Some(sender);
        self
    }

    /// Channel receiving header task notifications.
    pub fn task_target(mut self, sender: mpsc::UnboundedSender<TaskEvent>) -> Self {
        self.task_out = Some(sender);
        self
    }

    /// Channel receiving consensus payloads and persist notifications.
    pub fn consensus_target(mut self, sender: mpsc::UnboundedSender<ConsensusEvent>) -> Self {
        self.consensus_out = Some(sender);
        self
    }

    /// Initializes the ledger (persisting genesis on a cold store) and
    /// spawns the dispatcher. Must run inside a tokio runtime.
    pub fn build(self) -> Result<BlockchainHandle> {
        let store = self.store;
        let params = Arc::new(ChainParams::new(self.settings)?);
        let mempool = Arc::new(MemPool::new(params.settings.mempool_capacity));
        let view_slot = Arc::new(RwLock::new(Arc::new(SnapshotView::new(store.clone()))));

        let (high_tx, high_rx) = mpsc::unbounded_channel();
        let (normal_tx, normal_rx) = mpsc::unbounded_channel();

        let mut actor = Blockchain {
            header_index: HeaderIndex::load(&SnapshotView::new(store.clone()))?,
            store,
            params: params.clone(),
            executor: self.executor,
            policy: self.policy,
            height: 0,
            block_cache: HashMap::new(),
            block_cache_unverified: HashMap::new(),
            mempool: mempool.clone(),
            relay_cache: RelayCache::new(RELAY_CACHE_CAPACITY),
            subscribers: Vec::new(),
            view_slot: view_slot.clone(),
            relay_out: self.relay_out,
            task_out: self.task_out,
            consensus_out: self.consensus_out,
            high_tx: high_tx.clone(),
            normal_tx: normal_tx.clone(),
        };
        actor.initialize()?;

        tokio::spawn(actor.run(high_rx, normal_rx));

        Ok(BlockchainHandle {
            high: high_tx,
            normal: normal_tx,
            mempool,
            view_slot,
            params,
        })
    }
}

/// Cloneable typed send API of the dispatcher.
#[derive(Clone)]
pub struct BlockchainHandle {
    high: mpsc::UnboundedSender<HighPriority>,
    normal: mpsc::UnboundedSender<NormalPriority>,
    mempool: Arc<MemPool>,
    view_slot: Arc<RwLock<Arc<SnapshotView>>>,
    params: Arc<ChainParams>,
}

impl BlockchainHandle {
    /// The current read-only view. Hold the returned `Arc` for the duration
    /// of one logical read.
    pub fn view(&self) -> Arc<SnapshotView> {
        self.view_slot.read().clone()
    }

    pub fn mempool(&self) -> &Arc<MemPool> {
        &self.mempool
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Height of the last persisted block.
    pub fn height(&self) -> Result<Option<u32>> {
        Ok(self.view().height()?)
    }

    pub fn current_block_hash(&self) -> Result<Option<UInt256>> {
        Ok(self.view().current_block()?.map(|head| head.hash))
    }

    pub fn header_height(&self) -> Result<Option<u32>> {
        Ok(self.view().current_header()?.map(|head| head.index))
    }

    pub fn contains_block(&self, hash: &UInt256) -> Result<bool> {
        Ok(self.view().contains_block(hash)?)
    }

    pub fn contains_transaction(&self, hash: &UInt256) -> Result<bool> {
        Ok(self.mempool.contains(hash) || self.view().contains_transaction(hash)?)
    }

    /// Submits a batch of headers; resolves when the batch was processed.
    pub async fn relay_headers(&self, headers: Vec<Header>) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.high
            .send(HighPriority::Headers(headers, Some(reply)))
            .map_err(|_| LedgerError::Disconnected)?;
        done.await.map_err(|_| LedgerError::Disconnected)
    }

    pub async fn relay_block(&self, block: Block) -> Result<RelayResultReason> {
        let (reply, answer) = oneshot::channel();
        self.high
            .send(HighPriority::Block(Box::new(block), Some(reply)))
            .map_err(|_| LedgerError::Disconnected)?;
        answer.await.map_err(|_| LedgerError::Disconnected)
    }

    pub async fn relay_transaction(&self, transaction: Transaction) -> Result<RelayResultReason> {
        let (reply, answer) = oneshot::channel();
        self.normal
            .send(NormalPriority::Transaction(Box::new(transaction), Some(reply)))
            .map_err(|_| LedgerError::Disconnected)?;
        answer.await.map_err(|_| LedgerError::Disconnected)
    }

    pub async fn relay_consensus(&self, payload: ConsensusPayload) -> Result<RelayResultReason> {
        let (reply, answer) = oneshot::channel();
        self.high
            .send(HighPriority::Consensus(Box::new(payload), Some(reply)))
            .map_err(|_| LedgerError::Disconnected)?;
        answer.await.map_err(|_| LedgerError::Disconnected)
    }

    /// Bulk-applies trusted blocks; each must be exactly `height + 1`.
    /// Returns the new height.
    pub async fn import(&self, blocks: Vec<Block>) -> Result<std::result::Result<u32, RelayResultReason>> {
        let (reply, answer) = oneshot::channel();
        self.normal
            .send(NormalPriority::Import { blocks, reply })
            .map_err(|_| LedgerError::Disconnected)?;
        answer.await.map_err(|_| LedgerError::Disconnected)
    }

    /// Registers a subscriber and returns its event stream. Dropping the
    /// receiver unregisters it.
    pub fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<LedgerEvent>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.normal
            .send(NormalPriority::Register(sender))
            .map_err(|_| LedgerError::Disconnected)?;
        Ok(receiver)
    }

    /// Stops the dispatcher. Messages already ahead of the stop marker in
    /// the high-priority queue are still processed.
    pub fn shutdown(&self) {
        let _ = self.high.send(HighPriority::Stop);
    }
}

struct Blockchain {
    store: Arc<dyn Store>,
    params: Arc<ChainParams>,
    executor: Arc<dyn ScriptExecutor>,
    policy: Arc<dyn PolicyFilter>,
    header_index: HeaderIndex,
    /// Height of the last persisted block. Valid after `initialize`.
    height: u32,
    /// Verified blocks ahead of the persisted height, keyed by hash.
    block_cache: HashMap<UInt256, Block>,
    /// Blocks beyond the header chain, keyed by index, awaiting verification.
    block_cache_unverified: HashMap<u32, Block>,
    mempool: Arc<MemPool>,
    relay_cache: RelayCache,
    subscribers: Vec<mpsc::UnboundedSender<LedgerEvent>>,
    view_slot: Arc<RwLock<Arc<SnapshotView>>>,
    relay_out: Option<mpsc::UnboundedSender<Inventory>>,
    task_out: Option<mpsc::UnboundedSender<TaskEvent>>,
    consensus_out: Option<mpsc::UnboundedSender<ConsensusEvent>>,
    high_tx: mpsc::UnboundedSender<HighPriority>,
    normal_tx: mpsc::UnboundedSender<NormalPriority>,
}

impl Blockchain {
    /// Persists genesis on a cold store and restores the cached height.
    fn initialize(&mut self) -> Result<()> {
        if self.header_index.is_empty() {
            info!(hash = %self.params.genesis.hash(), "persisting genesis block");
            let genesis = self.params.genesis.clone();
            self.persist(&genesis)?;
        } else {
            let view = self.view();
            self.height = view
                .height()?
                .ok_or_else(|| LedgerError::Inconsistent("headers without blocks".into()))?;
        }
        Ok(())
    }

    fn view(&self) -> Arc<SnapshotView> {
        self.view_slot.read().clone()
    }

    fn refresh_view(&self) {
        *self.view_slot.write() = Arc::new(SnapshotView::new(self.store.clone()));
    }

    async fn run(
        mut self,
        mut high_rx: mpsc::UnboundedReceiver<HighPriority>,
        mut normal_rx: mpsc::UnboundedReceiver<NormalPriority>,
    ) {
        loop {
            tokio::select! {
                biased;
                message = high_rx.recv() => match message {
                    Some(message) => {
                        if !self.handle_high(message) {
                            break;
                        }
                    }
                    None => break,
                },
                message = normal_rx.recv() => match message {
                    Some(message) => self.handle_normal(message),
                    None => break,
                },
            }
        }
        debug!("ledger dispatcher stopped");
    }

    /// Returns `false` when the dispatcher should stop.
    fn handle_high(&mut self, message: HighPriority) -> bool {
        match message {
            HighPriority::Headers(headers, ack) => {
                self.fatal_guard(|this| this.on_new_headers(headers));
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            HighPriority::Block(block, reply) => {
                let reason = self.fatal_guard(|this| this.on_new_block(*block));
                if let Some(reply) = reply {
                    let _ = reply.send(reason);
                }
            }
            HighPriority::Consensus(payload, reply) => {
                let reason = self.on_new_consensus(*payload);
                if let Some(reply) = reply {
                    let _ = reply.send(reason);
                }
            }
            HighPriority::Stop => return false,
        }
        true
    }

    fn handle_normal(&mut self, message: NormalPriority) {
        match message {
            NormalPriority::Transaction(transaction, reply) => {
                let reason = self.on_new_transaction(*transaction);
                if let Some(reply) = reply {
                    let _ = reply.send(reason);
                }
            }
            NormalPriority::Import { blocks, reply } => {
                let outcome = self.fatal_guard(|this| this.on_import(blocks));
                let _ = reply.send(outcome);
            }
            NormalPriority::Register(sender) => {
                self.subscribers.push(sender);
            }
        }
    }

    /// Runs a handler whose errors are all fatal: an error here means state
    /// is inconsistent mid-persist, and committing further would corrupt
    /// the store.
    fn fatal_guard<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> T {
        match f(self) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "unrecoverable ledger failure");
                panic!("ledger state corrupted: {e}");
            }
        }
    }

    fn on_new_headers(&mut self, headers: Vec<Header>) -> Result<()> {
        let mut snapshot = Snapshot::new(self.store.clone());
        for header in headers {
            let len = self.header_index.len() as u32;
            if header.index < len {
                continue;
            }
            if header.index > len {
                break;
            }
            let prev_hash = self
                .header_index
                .get(header.index - 1)
                .ok_or_else(|| LedgerError::Inconsistent("header index empty".into()))?;
            let prev = snapshot
                .blocks
                .try_get(&prev_hash)?
                .ok_or_else(|| LedgerError::Inconsistent("previous header record missing".into()))?
                .trimmed
                .header;
            if let Err(reason) = verify::verify_header(&header, &prev) {
                debug!(index = header.index, ?reason, "header rejected");
                break;
            }
            let hash = header.hash();
            self.header_index.append(hash);
            snapshot.blocks.add(
                hash,
                BlockState {
                    system_fee_amount: Fixed8::ZERO,
                    trimmed: TrimmedBlock::from_header(header),
                },
            )?;
            *snapshot.header_hash_index.get_and_change()? =
                HashIndexState::new(hash, self.header_index.len() as u32 - 1);
        }
        self.header_index.flush(&mut snapshot)?;
        snapshot.commit()?;
        if let Some(task) = &self.task_out {
            let _ = task.send(TaskEvent::HeaderTaskCompleted);
        }
        Ok(())
    }

    fn on_new_block(&mut self, block: Block) -> Result<RelayResultReason> {
        let hash = block.hash();
        if block.index() <= self.height {
            return Ok(RelayResultReason::AlreadyExists);
        }
        if self.block_cache.contains_key(&hash) {
            return Ok(RelayResultReason::AlreadyExists);
        }
        let header_len = self.header_index.len() as u32;
        if block.index() > header_len {
            debug!(index = block.index(), header_len, "block buffered beyond headers");
            self.block_cache_unverified.insert(block.index(), block);
            return Ok(RelayResultReason::UnableToVerify);
        }
        if block.index() == header_len {
            let prev_hash = self
                .header_index
                .get(block.index() - 1)
                .ok_or_else(|| LedgerError::Inconsistent("header index empty".into()))?;
            let prev = self
                .view()
                .block_state(&prev_hash)?
                .ok_or_else(|| LedgerError::Inconsistent("previous header record missing".into()))?
                .trimmed
                .header;
            if let Err(reason) = verify::verify_block(&block, &prev) {
                debug!(index = block.index(), ?reason, "block rejected");
                return Ok(RelayResultReason::Invalid);
            }
        } else if self.header_index.get(block.index()) != Some(hash) {
            return Ok(RelayResultReason::Invalid);
        }

        if block.index() == self.height + 1 {
            let relay_first = block.index() + RELAY_PROXIMITY >= self.header_index.len() as u32;
            if relay_first {
                self.relay(Inventory::Block(Box::new(block.clone())));
            }
            let mut current = block;
            loop {
                self.persist(&current)?;
                let next_index = self.height + 1;
                let next = self
                    .header_index
                    .get(next_index)
                    .and_then(|next_hash| self.block_cache.remove(&next_hash));
                match next {
                    Some(next_block) => current = next_block,
                    None => break,
                }
            }
            let mut snapshot = Snapshot::new(self.store.clone());
            self.header_index.flush(&mut snapshot)?;
            snapshot.commit()?;
            if let Some(buffered) = self.block_cache_unverified.remove(&(self.height + 1)) {
                let _ = self
                    .high_tx
                    .send(HighPriority::Block(Box::new(buffered), None));
            }
            Ok(RelayResultReason::Succeed)
        } else {
            if block.index() + RELAY_PROXIMITY >= self.header_index.len() as u32 {
                self.relay(Inventory::Block(Box::new(block.clone())));
            }
            if block.index() == header_len {
                // The block ran ahead of the header chain; record its header
                // so later headers/blocks can link onto it.
                self.header_index.append(hash);
                let mut snapshot = Snapshot::new(self.store.clone());
                snapshot.blocks.add(
                    hash,
                    BlockState {
                        system_fee_amount: Fixed8::ZERO,
                        trimmed: TrimmedBlock::from_header(block.header.clone()),
                    },
                )?;
                *snapshot.header_hash_index.get_and_change()? =
                    HashIndexState::new(hash, block.index());
                self.header_index.flush(&mut snapshot)?;
                snapshot.commit()?;
            }
            self.block_cache.insert(hash, block);
            Ok(RelayResultReason::Succeed)
        }
    }

    /// Applies, commits and announces one block at exactly `height + 1`
    /// (or genesis on a cold store).
    fn persist(&mut self, block: &Block) -> Result<()> {
        let mut snapshot = Snapshot::new(self.store.clone());
        let executions = apply_block(&mut snapshot, block, &self.params, self.executor.as_ref())?;
        if block.index() as usize == self.header_index.len() {
            // Block arrived without a prior header; extend the chain here.
            self.header_index.append(block.hash());
            *snapshot.header_hash_index.get_and_change()? =
                HashIndexState::new(block.hash(), block.index());
        }
        snapshot.commit()?;
        self.height = block.index();
        self.refresh_view();
        info!(height = self.height, hash = %block.hash(), "block persisted");
        self.on_persist_completed(block, executions);
        Ok(())
    }

    fn on_persist_completed(&mut self, block: &Block, executions: Vec<ApplicationExecuted>) {
        self.block_cache.remove(&block.hash());
        for transaction in &block.transactions {
            self.mempool.try_remove(&transaction.hash());
        }
        // Copy the survivors out before clearing: the reinsertions below are
        // self-sends, processed only after the current message completes.
        let survivors = self.mempool.snapshot_descending();
        self.mempool.clear();
        for item in survivors {
            let transaction = (*item.transaction).clone();
            let _ = self
                .normal_tx
                .send(NormalPriority::Transaction(Box::new(transaction), None));
        }

        let block = Arc::new(block.clone());
        for execution in executions {
            self.distribute(LedgerEvent::ApplicationExecuted(Arc::new(execution)));
        }
        if let Some(consensus) = &self.consensus_out {
            let _ = consensus.send(ConsensusEvent::PersistCompleted {
                block: block.clone(),
            });
        }
        self.distribute(LedgerEvent::PersistCompleted { block });
    }

    fn on_new_transaction(&mut self, transaction: Transaction) -> RelayResultReason {
        if transaction.is_miner() {
            return RelayResultReason::Invalid;
        }
        let hash = transaction.hash();
        if self.mempool.contains(&hash) {
            return RelayResultReason::AlreadyExists;
        }
        let view = self.view();
        match view.contains_transaction(&hash) {
            Ok(false) => {}
            Ok(true) => return RelayResultReason::AlreadyExists,
            Err(e) => {
                warn!(error = %e, "store read failed during tx admission");
                return RelayResultReason::Unknown;
            }
        }
        match verify::verify_transaction(&transaction, &view, &self.mempool, &self.params) {
            Ok(()) => {}
            Err(VerifyError::Invalid(reason)) => {
                debug!(%hash, reason, "transaction rejected");
                return RelayResultReason::Invalid;
            }
            Err(VerifyError::Storage(e)) => {
                warn!(%hash, error = %e, "store read failed during verification");
                return RelayResultReason::Unknown;
            }
        }
        if !self.policy.check(&transaction, &view) {
            return RelayResultReason::PolicyFail;
        }
        let network_fee = match verify::network_fee(&transaction, &view, &self.params) {
            Ok(fee) => fee,
            Err(_) => return RelayResultReason::Invalid,
        };
        let size = transaction.size();
        let item = PoolItem::new(transaction.clone(), network_fee, size);
        if !self.mempool.try_add(item) {
            return RelayResultReason::AlreadyExists;
        }
        let evicted = self.mempool.enforce_capacity();
        if evicted.contains(&hash) {
            return RelayResultReason::OutOfMemory;
        }
        self.relay(Inventory::Transaction(Box::new(transaction)));
        RelayResultReason::Succeed
    }

    fn on_new_consensus(&mut self, payload: ConsensusPayload) -> RelayResultReason {
        let hash = payload.hash();
        if self.relay_cache.contains(&hash) {
            return RelayResultReason::AlreadyExists;
        }
        if payload.block_index <= self.height {
            return RelayResultReason::Expired;
        }
        match payload.verify_witness() {
            Ok(true) => {}
            _ => return RelayResultReason::Invalid,
        }
        if let Some(consensus) = &self.consensus_out {
            let _ = consensus.send(ConsensusEvent::Payload(Arc::new(payload.clone())));
        }
        self.relay_cache.add(payload.clone());
        self.relay(Inventory::Consensus(Box::new(payload)));
        RelayResultReason::Succeed
    }

    fn on_import(
        &mut self,
        blocks: Vec<Block>,
    ) -> Result<std::result::Result<u32, RelayResultReason>> {
        for block in blocks {
            if block.index() <= self.height {
                continue;
            }
            if block.index() != self.height + 1 {
                warn!(index = block.index(), height = self.height, "import gap");
                return Ok(Err(RelayResultReason::Invalid));
            }
            // Trusted bulk path: structural and linkage checks only, no
            // witness verification.
            if block.check_structure().is_err() {
                return Ok(Err(RelayResultReason::Invalid));
            }
            let tip = self
                .header_index
                .get(self.height)
                .ok_or_else(|| LedgerError::Inconsistent("header index empty".into()))?;
            if block.header.prev_hash != tip {
                return Ok(Err(RelayResultReason::Invalid));
            }
            self.persist(&block)?;
        }
        let mut snapshot = Snapshot::new(self.store.clone());
        self.header_index.flush(&mut snapshot)?;
        snapshot.commit()?;
        Ok(Ok(self.height))
    }

    fn relay(&self, inventory: Inventory) {
        if let Some(out) = &self.relay_out {
            let _ = out.send(inventory);
        }
    }

    /// Sends to every live subscriber, dropping the ones that have gone
    /// away (their `Terminated` signal is the closed channel).
    fn distribute(&mut self, event: LedgerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

