//! Runs invocation transactions when their block is persisted.

use onyx_core::{Transaction, TransactionType, UInt256};
use onyx_vm::{ExecutionEngine, StackItem, VMState};
use tracing::debug;

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub tx_hash: UInt256,
    pub state: VMState,
    /// Evaluation stack at the end of the run, bottom first.
    pub stack: Vec<StackItem>,
    pub fault_message: Option<String>,
}

impl ExecutionResult {
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.state.is_halt()
    }
}

/// Runs `tx` in a fresh engine. Returns `None` for transactions without a script.
///
/// A fault is recorded in the result; it never aborts the caller.
pub fn execute_transaction(tx: &Transaction) -> Option<ExecutionResult> {
    if tx.tx_type != TransactionType::Invocation {
        return None;
    }
    let tx_hash = tx.hash();
    let mut engine = ExecutionEngine::new();
    let state = match engine.load_script(tx.payload.clone()) {
        Ok(()) => engine.execute(),
        Err(_) => VMState::FAULT,
    };
    if state.is_fault() {
        debug!(%tx_hash, fault = ?engine.fault_message(), "invocation faulted");
    }
    Some(ExecutionResult {
        tx_hash,
        state,
        stack: engine.evaluation_stack().to_vec(),
        fault_message: engine.fault_message().map(str::to_owned),
    })
}

/// Runs every invocation in `transactions`, in block order.
pub fn execute_block(transactions: &[Transaction]) -> Vec<ExecutionResult> {
    transactions.iter().filter_map(execute_transaction).collect()
}
