//! Mempool admission through the dispatcher: capacity pressure and the
//! eviction contest.

mod common;

use basalt_core::{CoinReference, Fixed8, Transaction, TransactionOutput, UInt160};
use basalt_ledger::RelayResultReason;
use common::{contract_tx, TestChain};

/// Builds one spend per funded output; every transaction has zero network
/// fee, so pool priority degenerates to the hash tie-break and the contest
/// outcome is fully deterministic.
fn competing_spends(
    chain: &TestChain,
    split_hash: basalt_core::UInt256,
    count: u16,
) -> Vec<Transaction> {
    let governing = chain.params.governing_token_hash;
    let committee = chain.committee_address();
    let mut spends: Vec<Transaction> = (0..count)
        .map(|index| {
            let mut tx = contract_tx(
                vec![CoinReference {
                    prev_hash: split_hash,
                    prev_index: index,
                }],
                vec![TransactionOutput {
                    asset_id: governing,
                    value: Fixed8::from_whole(1_000_000).unwrap(),
                    script_hash: committee,
                }],
            );
            chain.sign_committee(&mut tx);
            tx
        })
        .collect();
    // Ascending numeric hash order, i.e. ascending pool priority.
    spends.sort_by(|a, b| a.hash().cmp(&b.hash()));
    spends
}

#[tokio::test]
async fn eviction_keeps_highest_priority_and_reports_out_of_memory() {
    let capacity = 3;
    let chain = TestChain::with_capacity(4, capacity);
    let ledger = chain.build_ledger();
    let governing = chain.params.governing_token_hash;
    let committee = chain.committee_address();
    let supply = basalt_config::GOVERNING_TOKEN_SUPPLY;

    // Fund four equal coins plus change.
    let mut outputs: Vec<TransactionOutput> = (0..4)
        .map(|_| TransactionOutput {
            asset_id: governing,
            value: Fixed8::from_whole(1_000_000).unwrap(),
            script_hash: committee,
        })
        .collect();
    outputs.push(TransactionOutput {
        asset_id: governing,
        value: Fixed8::from_whole(supply - 4_000_000).unwrap(),
        script_hash: committee,
    });
    let mut split = contract_tx(vec![chain.genesis_issue_output()], outputs);
    chain.sign_committee(&mut split);
    let split_hash = split.hash();
    let genesis = chain.params.genesis.header.clone();
    let block1 = chain.make_block(&genesis, 1, vec![split]);
    assert_eq!(
        ledger.relay_block(block1).await.unwrap(),
        RelayResultReason::Succeed
    );

    let spends = competing_spends(&chain, split_hash, 4);
    let loser = spends[0].clone();

    // Fill the pool with the three higher-priority spends.
    for spend in &spends[1..] {
        assert_eq!(
            ledger.relay_transaction(spend.clone()).await.unwrap(),
            RelayResultReason::Succeed
        );
    }
    assert_eq!(ledger.mempool().len(), capacity);

    // The lowest-priority spend is admitted, loses the eviction contest
    // and is reported as OutOfMemory.
    assert_eq!(
        ledger.relay_transaction(loser.clone()).await.unwrap(),
        RelayResultReason::OutOfMemory
    );
    assert_eq!(ledger.mempool().len(), capacity);
    assert!(!ledger.mempool().contains(&loser.hash()));
    for spend in &spends[1..] {
        assert!(ledger.mempool().contains(&spend.hash()));
    }
}

#[tokio::test]
async fn newcomer_with_higher_priority_displaces_the_lowest() {
    let capacity = 3;
    let chain = TestChain::with_capacity(4, capacity);
    let ledger = chain.build_ledger();
    let governing = chain.params.governing_token_hash;
    let committee = chain.committee_address();
    let supply = basalt_config::GOVERNING_TOKEN_SUPPLY;

    let mut outputs: Vec<TransactionOutput> = (0..4)
        .map(|_| TransactionOutput {
            asset_id: governing,
            value: Fixed8::from_whole(1_000_000).unwrap(),
            script_hash: committee,
        })
        .collect();
    outputs.push(TransactionOutput {
        asset_id: governing,
        value: Fixed8::from_whole(supply - 4_000_000).unwrap(),
        script_hash: committee,
    });
    let mut split = contract_tx(vec![chain.genesis_issue_output()], outputs);
    chain.sign_committee(&mut split);
    let split_hash = split.hash();
    let genesis = chain.params.genesis.header.clone();
    let block1 = chain.make_block(&genesis, 1, vec![split]);
    ledger.relay_block(block1).await.unwrap();

    let spends = competing_spends(&chain, split_hash, 4);

    // Fill with the three LOWEST first, then submit the highest.
    for spend in &spends[..3] {
        assert_eq!(
            ledger.relay_transaction(spend.clone()).await.unwrap(),
            RelayResultReason::Succeed
        );
    }
    assert_eq!(
        ledger.relay_transaction(spends[3].clone()).await.unwrap(),
        RelayResultReason::Succeed
    );
    assert_eq!(ledger.mempool().len(), capacity);
    // The lowest-priority entry was evicted to make room.
    assert!(!ledger.mempool().contains(&spends[0].hash()));
    assert!(ledger.mempool().contains(&spends[3].hash()));
}

#[tokio::test]
async fn unknown_inputs_are_invalid() {
    let chain = TestChain::new(4);
    let ledger = chain.build_ledger();

    let mut tx = contract_tx(
        vec![CoinReference {
            prev_hash: basalt_core::UInt256::from([0xEE; 32]),
            prev_index: 0,
        }],
        vec![TransactionOutput {
            asset_id: chain.params.governing_token_hash,
            value: Fixed8::from_whole(1).unwrap(),
            script_hash: UInt160::from([1u8; 20]),
        }],
    );
    chain.sign_committee(&mut tx);
    assert_eq!(
        ledger.relay_transaction(tx).await.unwrap(),
        RelayResultReason::Invalid
    );
}

#[tokio::test]
async fn wrong_witness_is_invalid() {
    let chain = TestChain::new(4);
    let ledger = chain.build_ledger();
    let governing = chain.params.governing_token_hash;

    // Spend the committee's coin with a random key's witness.
    let stranger = basalt_core::KeyPair::generate();
    let mut theft = contract_tx(
        vec![chain.genesis_issue_output()],
        vec![TransactionOutput {
            asset_id: governing,
            value: Fixed8::from_whole(basalt_config::GOVERNING_TOKEN_SUPPLY).unwrap(),
            script_hash: stranger.public_key().to_script_hash(),
        }],
    );
    theft.witnesses = vec![basalt_core::witness::sign_single(
        &theft.unsigned_bytes(),
        &stranger,
    )];
    assert_eq!(
        ledger.relay_transaction(theft).await.unwrap(),
        RelayResultReason::Invalid
    );
}
