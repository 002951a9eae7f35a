//! Header chain running ahead of blocks, and the batched hash-list flush.

mod common;

use basalt_core::state::HEADER_HASH_LIST_BATCH;
use basalt_core::{Block, Header};
use basalt_ledger::RelayResultReason;
use common::TestChain;

const CHAIN_LEN: usize = 2500;

fn build_chain(chain: &TestChain, length: usize) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(length);
    let mut prev = chain.params.genesis.header.clone();
    for n in 0..length {
        let block = chain.make_block(&prev, n as u32 + 1, Vec::new());
        prev = block.header.clone();
        blocks.push(block);
    }
    blocks
}

#[tokio::test]
async fn headers_ahead_of_blocks_flush_in_batches() {
    // One validator keeps the signature volume manageable.
    let chain = TestChain::new(1);
    let ledger = chain.build_ledger();

    let blocks = build_chain(&chain, CHAIN_LEN);
    let headers: Vec<Header> = blocks.iter().map(|b| b.header.clone()).collect();

    ledger.relay_headers(headers).await.unwrap();
    assert_eq!(ledger.header_height().unwrap(), Some(CHAIN_LEN as u32));
    assert_eq!(ledger.height().unwrap(), Some(0));

    // Genesis plus 2500 headers crosses one batch boundary exactly once.
    let lists = ledger.view().header_hash_lists().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].0, 0);
    assert_eq!(lists[0].1.hashes.len(), HEADER_HASH_LIST_BATCH);

    for block in blocks {
        assert_eq!(
            ledger.relay_block(block).await.unwrap(),
            RelayResultReason::Succeed
        );
    }
    assert_eq!(ledger.height().unwrap(), Some(CHAIN_LEN as u32));
    assert_eq!(ledger.header_height().unwrap(), Some(CHAIN_LEN as u32));

    // No additional batch: 2501 known headers still hold exactly one
    // flushed batch of 2000.
    let lists = ledger.view().header_hash_lists().unwrap();
    assert_eq!(lists.len(), 1);
}

#[tokio::test]
async fn replayed_headers_are_ignored() {
    let chain = TestChain::new(1);
    let ledger = chain.build_ledger();

    let blocks = build_chain(&chain, 5);
    let headers: Vec<Header> = blocks.iter().map(|b| b.header.clone()).collect();

    ledger.relay_headers(headers.clone()).await.unwrap();
    assert_eq!(ledger.header_height().unwrap(), Some(5));

    // Replay is a no-op, not an error.
    ledger.relay_headers(headers).await.unwrap();
    assert_eq!(ledger.header_height().unwrap(), Some(5));
}

#[tokio::test]
async fn gapped_header_batch_stops_at_the_gap() {
    let chain = TestChain::new(1);
    let ledger = chain.build_ledger();

    let blocks = build_chain(&chain, 5);
    // Submit headers 1, 2 and then 4: processing stops before the gap.
    let headers = vec![
        blocks[0].header.clone(),
        blocks[1].header.clone(),
        blocks[3].header.clone(),
    ];
    ledger.relay_headers(headers).await.unwrap();
    assert_eq!(ledger.header_height().unwrap(), Some(2));
}

#[tokio::test]
async fn blocks_restore_header_state_after_restart() {
    let chain = TestChain::new(1);
    let store = basalt_storage::MemoryStore::new();
    let blocks = build_chain(&chain, HEADER_HASH_LIST_BATCH + 10);
    {
        let ledger = chain.build_ledger_on(store.clone());
        let headers: Vec<Header> = blocks.iter().map(|b| b.header.clone()).collect();
        ledger.relay_headers(headers).await.unwrap();
        assert_eq!(
            ledger.header_height().unwrap(),
            Some(HEADER_HASH_LIST_BATCH as u32 + 10)
        );
    }

    // A fresh ledger rebuilds the same header chain: the flushed prefix
    // from the hash lists, the suffix by walking back from the head.
    let reopened = chain.build_ledger_on(store);
    assert_eq!(
        reopened.header_height().unwrap(),
        Some(HEADER_HASH_LIST_BATCH as u32 + 10)
    );
}
