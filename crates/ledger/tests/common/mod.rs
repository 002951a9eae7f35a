//! Shared fixtures: a private chain whose standby validators are freshly
//! generated keypairs, so tests can sign real headers and witnesses.

#![allow(dead_code)]

use std::sync::Arc;

use basalt_config::{NetworkType, ProtocolSettings, SystemFees};
use basalt_core::transaction::TransactionData;
use basalt_core::{
    merkle, script, witness, Block, CoinReference, ECPoint, Header, KeyPair, Transaction,
    TransactionOutput, UInt160, Witness,
};
use basalt_ledger::{BlockchainHandle, ChainParams, LedgerBuilder};
use basalt_storage::MemoryStore;

pub struct TestChain {
    pub keys: Vec<KeyPair>,
    pub pubkeys: Vec<ECPoint>,
    pub settings: ProtocolSettings,
    pub params: ChainParams,
}

impl TestChain {
    pub fn new(validators: usize) -> Self {
        Self::with_capacity(validators, basalt_config::MEMPOOL_CAPACITY)
    }

    pub fn with_capacity(validators: usize, mempool_capacity: usize) -> Self {
        let keys: Vec<KeyPair> = (0..validators).map(|_| KeyPair::generate()).collect();
        let pubkeys: Vec<ECPoint> = keys.iter().map(KeyPair::public_key).collect();
        let settings = ProtocolSettings {
            network: NetworkType::Private,
            seconds_per_block: 15,
            standby_validators: pubkeys.iter().map(ECPoint::to_string).collect(),
            system_fees: SystemFees::default(),
            mempool_capacity,
        };
        let params = ChainParams::new(settings.clone()).unwrap();
        Self {
            keys,
            pubkeys,
            settings,
            params,
        }
    }

    pub fn build_ledger(&self) -> BlockchainHandle {
        LedgerBuilder::new(MemoryStore::new(), self.settings.clone())
            .build()
            .unwrap()
    }

    pub fn build_ledger_on(&self, store: Arc<MemoryStore>) -> BlockchainHandle {
        LedgerBuilder::new(store, self.settings.clone())
            .build()
            .unwrap()
    }

    fn consensus_threshold(&self) -> usize {
        let n = self.keys.len();
        n - (n - 1) / 3
    }

    fn committee_threshold(&self) -> usize {
        self.keys.len() / 2 + 1
    }

    pub fn committee_address(&self) -> UInt160 {
        script::committee_address(&self.pubkeys).unwrap()
    }

    /// The genesis output carrying the full governing supply.
    pub fn genesis_issue_output(&self) -> CoinReference {
        CoinReference {
            prev_hash: self.params.genesis.transactions[3].hash(),
            prev_index: 0,
        }
    }

    /// Signs a transaction with the committee multi-sig (the owner of the
    /// genesis supply).
    pub fn sign_committee(&self, transaction: &mut Transaction) {
        let m = self.committee_threshold();
        let signers: Vec<&KeyPair> = self.keys.iter().take(m).collect();
        let w = witness::sign_multi(
            &transaction.unsigned_bytes(),
            m,
            &self.pubkeys,
            &signers,
        )
        .unwrap();
        transaction.witnesses = vec![w];
    }

    /// Builds a valid signed block on top of `prev`.
    pub fn make_block(&self, prev: &Header, nonce: u32, txs: Vec<Transaction>) -> Block {
        let miner = Transaction::new(TransactionData::Miner { nonce });
        let mut transactions = vec![miner];
        transactions.extend(txs);
        let merkle_root = merkle::merkle_root(
            &transactions.iter().map(Transaction::hash).collect::<Vec<_>>(),
        );
        let mut header = Header {
            version: 0,
            prev_hash: prev.hash(),
            merkle_root,
            timestamp: prev.timestamp + self.settings.seconds_per_block,
            index: prev.index + 1,
            consensus_data: nonce as u64,
            next_consensus: self.params.consensus_address,
            witness: Witness::default(),
        };
        let m = self.consensus_threshold();
        let signers: Vec<&KeyPair> = self.keys.iter().take(m).collect();
        header.witness =
            witness::sign_multi(&header.unsigned_bytes(), m, &self.pubkeys, &signers).unwrap();
        Block {
            header,
            transactions,
        }
    }
}

pub fn contract_tx(inputs: Vec<CoinReference>, outputs: Vec<TransactionOutput>) -> Transaction {
    let mut tx = Transaction::new(TransactionData::Contract);
    tx.inputs = inputs;
    tx.outputs = outputs;
    tx
}

/// Drains both mailbox priorities so self-sends (unverified block
/// re-dispatch, mempool reinsertion) have been processed. Two rounds cover
/// the persist → reinsert cascade.
pub async fn settle(handle: &BlockchainHandle) {
    for _ in 0..2 {
        handle.relay_headers(Vec::new()).await.unwrap();
        let miner = Transaction::new(TransactionData::Miner { nonce: 0 });
        let _ = handle.relay_transaction(miner).await.unwrap();
    }
}
