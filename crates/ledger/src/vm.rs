//! Seam to the script engine.
//!
//! The VM is an external collaborator: the persist engine hands it a cloned
//! snapshot and a script, and merges the sandbox back only when execution
//! halts cleanly. From the ledger's perspective execution is a pure function
//! of (script, gas, container, snapshot).

use basalt_core::{Fixed8, UInt160, UInt256};
use basalt_storage::Snapshot;

/// Final VM state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Halt,
    Fault,
}

/// What the ledger asks the engine to run.
#[derive(Debug)]
pub struct ExecutionRequest<'a> {
    pub script: &'a [u8],
    /// Gas budget the transaction paid for.
    pub gas: Fixed8,
    /// Hash of the containing invocation transaction.
    pub container: UInt256,
}

/// Event emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub contract: UInt160,
    pub payload: Vec<u8>,
}

/// Everything recorded about one execution, successful or not.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub state: VmState,
    pub gas_consumed: Fixed8,
    pub stack: Vec<Vec<u8>>,
    pub notifications: Vec<Notification>,
}

/// Result of an invocation transaction, distributed to subscribers after
/// the block commits.
#[derive(Debug, Clone)]
pub struct ApplicationExecuted {
    pub tx_hash: UInt256,
    pub outcome: ExecutionOutcome,
}

/// The script engine interface. Implementations run the script against the
/// sandbox snapshot; the ledger decides whether the writes survive.
pub trait ScriptExecutor: Send + Sync {
    fn execute(&self, request: ExecutionRequest<'_>, sandbox: &mut Snapshot) -> ExecutionOutcome;
}

/// Stand-in when no VM plugin is loaded: every script halts with an empty
/// stack and touches nothing. Fee accounting still applies upstream.
#[derive(Debug, Default)]
pub struct NullExecutor;

impl ScriptExecutor for NullExecutor {
    fn execute(&self, request: ExecutionRequest<'_>, _sandbox: &mut Snapshot) -> ExecutionOutcome {
        ExecutionOutcome {
            state: VmState::Halt,
            gas_consumed: request.gas,
            stack: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_storage::MemoryStore;

    #[test]
    fn null_executor_halts_without_writes() {
        let store = MemoryStore::new();
        let mut sandbox = Snapshot::new(store);
        let outcome = NullExecutor.execute(
            ExecutionRequest {
                script: &[0x51],
                gas: Fixed8::from_whole(3).unwrap(),
                container: UInt256::zero(),
            },
            &mut sandbox,
        );
        assert_eq!(outcome.state, VmState::Halt);
        assert_eq!(outcome.gas_consumed, Fixed8::from_whole(3).unwrap());
        assert!(outcome.stack.is_empty());
    }
}
