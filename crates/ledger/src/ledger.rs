//! The chain store.
//!
//! [`Ledger`] is the seam the consensus service commits through.
//! [`MemoryLedger`] keeps the whole chain in memory and serialises appends
//! behind one write lock, so only one block per height can ever be stored.

use crate::block::{Block, BlockBuilder, Header};
use crate::error::{LedgerError, LedgerResult};
use crate::execution::{execute_block, ExecutionResult};
use crate::tx_pool::check_transaction;
use crate::validator_selector::{address_from_bookkeepers, ValidatorSelector, VoteValidatorSelector};
use async_trait::async_trait;
use onyx_core::{Transaction, UInt256};
use onyx_cryptography::PublicKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the persisted-block notification channel.
const NOTIFICATION_CAPACITY: usize = 64;

/// Read and append access to the chain.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Height of the newest block.
    fn current_height(&self) -> u32;

    /// Hash of the newest block.
    fn current_block_hash(&self) -> UInt256;

    fn header_by_hash(&self, hash: &UInt256) -> Option<Header>;

    fn is_block_persisted(&self, hash: &UInt256) -> bool;

    /// Bookkeepers that must sign the next block, in index order.
    fn bookkeepers(&self) -> Vec<PublicKey>;

    /// Notifies each block once it is stored.
    fn subscribe(&self) -> broadcast::Receiver<Arc<Block>>;

    /// Validates and stores the block that extends the tip.
    ///
    /// Appending a block that is already stored succeeds without effect.
    async fn append_block(&self, block: Block) -> LedgerResult<()>;
}

/// Builds the genesis block for `bookkeepers`.
pub fn genesis_block(bookkeepers: &[PublicKey], timestamp: u32) -> LedgerResult<Block> {
    Ok(BlockBuilder::new()
        .timestamp(timestamp)
        .next_bookkeeper(address_from_bookkeepers(bookkeepers)?)
        .transactions(vec![Transaction::bookkeeping(0)])
        .build(Vec::new(), Vec::new()))
}

#[derive(Debug, Default)]
struct ChainState {
    /// Indexed by height.
    blocks: Vec<Block>,
    heights: HashMap<UInt256, u32>,
    transactions: HashMap<UInt256, u32>,
    executions: HashMap<UInt256, ExecutionResult>,
    bookkeepers: Vec<PublicKey>,
}

impl ChainState {
    fn tip(&self) -> LedgerResult<&Block> {
        self.blocks
            .last()
            .ok_or_else(|| LedgerError::invalid_block("chain has no genesis block"))
    }

    fn insert(&mut self, block: Block, bookkeepers: Vec<PublicKey>, executions: Vec<ExecutionResult>) {
        let height = block.height();
        self.heights.insert(block.hash(), height);
        for tx in block.transactions.iter().filter(|tx| !tx.is_bookkeeping()) {
            self.transactions.insert(tx.hash(), height);
        }
        for result in executions {
            self.executions.insert(result.tx_hash, result);
        }
        self.bookkeepers = bookkeepers;
        self.blocks.push(block);
    }
}

/// An in-memory [`Ledger`].
pub struct MemoryLedger {
    chain: RwLock<ChainState>,
    selector: Arc<dyn ValidatorSelector>,
    persisted: broadcast::Sender<Arc<Block>>,
}

impl MemoryLedger {
    /// Creates a chain holding only `genesis`, signed for by `bookkeepers`.
    pub fn new(
        genesis: Block,
        bookkeepers: Vec<PublicKey>,
        selector: Arc<dyn ValidatorSelector>,
    ) -> LedgerResult<Self> {
        if genesis.height() != 0 {
            return Err(LedgerError::invalid_block("genesis must be at height 0"));
        }
        let mut bookkeepers = bookkeepers;
        bookkeepers.sort();
        if genesis.header.next_bookkeeper != address_from_bookkeepers(&bookkeepers)? {
            return Err(LedgerError::invalid_block(
                "genesis next bookkeeper does not match the initial bookkeepers",
            ));
        }
        let executions = execute_block(&genesis.transactions);
        let mut chain = ChainState::default();
        chain.insert(genesis, bookkeepers, executions);

        let (persisted, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Ok(Self {
            chain: RwLock::new(chain),
            selector,
            persisted,
        })
    }

    /// Creates a chain from a generated genesis block, with vote-based selection.
    pub fn with_genesis(bookkeepers: Vec<PublicKey>, timestamp: u32) -> LedgerResult<Self> {
        let genesis = genesis_block(&bookkeepers, timestamp)?;
        Self::new(genesis, bookkeepers, Arc::new(VoteValidatorSelector))
    }

    pub fn block(&self, height: u32) -> Option<Block> {
        self.chain.read().blocks.get(height as usize).cloned()
    }

    pub fn current_header(&self) -> Option<Header> {
        self.chain.read().blocks.last().map(|block| block.header.clone())
    }

    pub fn contains_transaction(&self, hash: &UInt256) -> bool {
        self.chain.read().transactions.contains_key(hash)
    }

    /// Result of running an invocation transaction, once its block is stored.
    pub fn execution_result(&self, hash: &UInt256) -> Option<ExecutionResult> {
        self.chain.read().executions.get(hash).cloned()
    }

    /// Checks `block` against the tip and returns the bookkeepers that follow it.
    fn validate(&self, chain: &ChainState, block: &Block) -> LedgerResult<Vec<PublicKey>> {
        let tip = chain.tip()?;
        let header = &block.header;
        if header.height != tip.height() + 1 {
            return Err(LedgerError::HeightMismatch {
                tip: tip.height(),
                actual: header.height,
            });
        }
        if header.prev_hash != tip.hash() {
            return Err(LedgerError::invalid_block("previous hash does not match the tip"));
        }
        if header.timestamp <= tip.header.timestamp {
            return Err(LedgerError::invalid_block("timestamp does not advance"));
        }
        if header.transactions_root != block.compute_transactions_root() {
            return Err(LedgerError::invalid_block("transactions root mismatch"));
        }

        match block.transactions.split_first() {
            Some((first, rest)) if first.is_bookkeeping() => {
                for tx in rest {
                    check_transaction(tx)?;
                    if chain.transactions.contains_key(&tx.hash()) {
                        return Err(LedgerError::DuplicateTransaction(tx.hash()));
                    }
                }
            }
            _ => {
                return Err(LedgerError::invalid_block(
                    "first transaction must be the bookkeeping transaction",
                ))
            }
        }

        header.verify_witness(&chain.bookkeepers)?;

        let mut next = self
            .selector
            .next_bookkeepers(&chain.bookkeepers, &block.transactions)?;
        next.sort();
        if header.next_bookkeeper != address_from_bookkeepers(&next)? {
            return Err(LedgerError::invalid_block(
                "next bookkeeper does not match the selected validator set",
            ));
        }
        Ok(next)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn current_height(&self) -> u32 {
        self.chain.read().blocks.len().saturating_sub(1) as u32
    }

    fn current_block_hash(&self) -> UInt256 {
        self.chain
            .read()
            .blocks
            .last()
            .map(Block::hash)
            .unwrap_or_default()
    }

    fn header_by_hash(&self, hash: &UInt256) -> Option<Header> {
        let chain = self.chain.read();
        let height = *chain.heights.get(hash)?;
        chain.blocks.get(height as usize).map(|b| b.header.clone())
    }

    fn is_block_persisted(&self, hash: &UInt256) -> bool {
        self.chain.read().heights.contains_key(hash)
    }

    fn bookkeepers(&self) -> Vec<PublicKey> {
        self.chain.read().bookkeepers.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<Arc<Block>> {
        self.persisted.subscribe()
    }

    async fn append_block(&self, block: Block) -> LedgerResult<()> {
        let hash = block.hash();
        let next = {
            let chain = self.chain.read();
            if chain.heights.contains_key(&hash) {
                debug!(%hash, "block already persisted");
                return Ok(());
            }
            self.validate(&chain, &block)?
        };

        let executions = execute_block(&block.transactions);
        let failed = executions.iter().filter(|r| !r.succeeded()).count();

        let block = Arc::new(block);
        {
            let mut chain = self.chain.write();
            if chain.heights.contains_key(&hash) {
                return Ok(());
            }
            // Another append may have won the height while the lock was released.
            let tip = chain.tip()?;
            if tip.hash() != block.header.prev_hash {
                return Err(LedgerError::HeightMismatch {
                    tip: tip.height(),
                    actual: block.height(),
                });
            }
            chain.insert(block.as_ref().clone(), next, executions);
        }

        info!(
            height = block.height(),
            %hash,
            transactions = block.transactions.len(),
            failed,
            "block persisted"
        );
        let _ = self.persisted.send(block);
        Ok(())
    }
}
