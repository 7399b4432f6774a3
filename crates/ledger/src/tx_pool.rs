//! Transaction pool.

use crate::block::Block;
use crate::error::{LedgerError, LedgerResult};
use indexmap::IndexMap;
use onyx_core::{Transaction, TransactionType, UInt256, MAX_TRANSACTION_PAYLOAD};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Memory pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Maximum number of transactions held.
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 50_000,
        }
    }
}

/// The pool as seen by the consensus service.
pub trait TxPool: Send + Sync {
    /// Transactions eligible for a block whose duplicate checks start at
    /// `valid_height`, in arrival order.
    fn pending_transactions(&self, valid_height: u32, max: usize) -> Vec<Transaction>;

    /// Validates a proposed batch, excluding the leading bookkeeping transaction.
    fn verify_block(&self, transactions: &[Transaction], valid_height: u32) -> LedgerResult<()>;
}

/// Checks a transaction on its own, outside any block context.
pub fn check_transaction(tx: &Transaction) -> LedgerResult<()> {
    let hash = tx.hash();
    if tx.payload.len() > MAX_TRANSACTION_PAYLOAD {
        return Err(LedgerError::invalid_transaction(hash, "payload too large"));
    }
    match tx.tx_type {
        TransactionType::Bookkeeping => Err(LedgerError::invalid_transaction(
            hash,
            "bookkeeping transactions are created by the primary",
        )),
        TransactionType::Vote => tx
            .vote_keys()
            .map(|_| ())
            .map_err(|e| LedgerError::invalid_transaction(hash, e.to_string())),
        TransactionType::Invocation if tx.payload.is_empty() => {
            Err(LedgerError::invalid_transaction(hash, "empty script"))
        }
        TransactionType::Invocation => Ok(()),
    }
}

/// An in-memory pool keyed by transaction hash, kept in arrival order.
#[derive(Debug, Default)]
pub struct MemoryPool {
    config: MempoolConfig,
    transactions: RwLock<IndexMap<UInt256, Transaction>>,
}

impl MemoryPool {
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: RwLock::new(IndexMap::new()),
        }
    }

    /// Adds a transaction after checking it.
    pub fn try_add(&self, tx: Transaction) -> LedgerResult<UInt256> {
        check_transaction(&tx)?;
        let hash = tx.hash();
        let mut transactions = self.transactions.write();
        if transactions.contains_key(&hash) {
            return Err(LedgerError::AlreadyPooled(hash));
        }
        if transactions.len() >= self.config.max_transactions {
            return Err(LedgerError::invalid_transaction(hash, "memory pool is full"));
        }
        transactions.insert(hash, tx);
        debug!(%hash, pooled = transactions.len(), "transaction added to pool");
        Ok(hash)
    }

    pub fn contains(&self, hash: &UInt256) -> bool {
        self.transactions.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    /// Drops every transaction included in `block`.
    pub fn remove_persisted(&self, block: &Block) {
        let mut transactions = self.transactions.write();
        for tx in &block.transactions {
            transactions.shift_remove(&tx.hash());
        }
    }
}

impl TxPool for MemoryPool {
    fn pending_transactions(&self, _valid_height: u32, max: usize) -> Vec<Transaction> {
        self.transactions.read().values().take(max).cloned().collect()
    }

    fn verify_block(&self, transactions: &[Transaction], _valid_height: u32) -> LedgerResult<()> {
        let mut seen = HashSet::with_capacity(transactions.len());
        for tx in transactions {
            check_transaction(tx)?;
            let hash = tx.hash();
            if !seen.insert(hash) {
                return Err(LedgerError::DuplicateTransaction(hash));
            }
        }
        Ok(())
    }
}
