//! Script execution through the sandbox seam: halted executions publish
//! their writes, faulted ones do not, and subscribers see the results.

mod common;

use std::sync::Arc;

use basalt_core::state::{StorageEntry, StorageEntryKey};
use basalt_core::transaction::TransactionData;
use basalt_core::{Fixed8, Transaction, UInt160};
use basalt_ledger::{
    ExecutionOutcome, ExecutionRequest, LedgerBuilder, LedgerEvent, RelayResultReason,
    ScriptExecutor, VmState,
};
use basalt_storage::{MemoryStore, Snapshot};
use common::{settle, TestChain};

/// Writes one marker entry per executed script, then halts or faults.
struct MarkerExecutor {
    state: VmState,
}

impl ScriptExecutor for MarkerExecutor {
    fn execute(&self, request: ExecutionRequest<'_>, sandbox: &mut Snapshot) -> ExecutionOutcome {
        let key = StorageEntryKey::new(UInt160::from([0xCC; 20]), request.script.to_vec());
        sandbox
            .storages
            .add(key, StorageEntry::new(b"ran".to_vec()))
            .unwrap();
        ExecutionOutcome {
            state: self.state,
            gas_consumed: request.gas,
            stack: vec![vec![0x01]],
            notifications: Vec::new(),
        }
    }
}

fn invocation(script: Vec<u8>) -> Transaction {
    Transaction::new(TransactionData::Invocation {
        script,
        gas: Fixed8::ZERO,
    })
}

async fn run_invocation(state: VmState) -> (bool, Option<LedgerEvent>) {
    let chain = TestChain::new(4);
    let ledger = LedgerBuilder::new(MemoryStore::new(), chain.settings.clone())
        .executor(Arc::new(MarkerExecutor { state }))
        .build()
        .unwrap();
    let mut events = ledger.subscribe().unwrap();
    settle(&ledger).await;

    let script = vec![0x51, 0x52];
    let genesis = chain.params.genesis.header.clone();
    let block1 = chain.make_block(&genesis, 1, vec![invocation(script.clone())]);
    assert_eq!(
        ledger.relay_block(block1).await.unwrap(),
        RelayResultReason::Succeed
    );

    let key = StorageEntryKey::new(UInt160::from([0xCC; 20]), script);
    let written = ledger.view().storage_entry(&key).unwrap().is_some();
    let event = events.recv().await;
    (written, event)
}

#[tokio::test]
async fn halted_execution_publishes_sandbox_writes() {
    let (written, event) = run_invocation(VmState::Halt).await;
    assert!(written);
    match event {
        Some(LedgerEvent::ApplicationExecuted(executed)) => {
            assert_eq!(executed.outcome.state, VmState::Halt);
            assert_eq!(executed.outcome.stack, vec![vec![0x01]]);
        }
        other => panic!("expected execution event, got {other:?}"),
    }
}

#[tokio::test]
async fn faulted_execution_discards_sandbox_writes() {
    let (written, event) = run_invocation(VmState::Fault).await;
    assert!(!written);
    // The execution is still recorded and distributed, fault included.
    match event {
        Some(LedgerEvent::ApplicationExecuted(executed)) => {
            assert_eq!(executed.outcome.state, VmState::Fault);
        }
        other => panic!("expected execution event, got {other:?}"),
    }
}
