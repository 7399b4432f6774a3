//! Sliding window of recently persisted transactions.
//!
//! Lets the consensus service reject proposals that repeat a transaction
//! from one of the last few blocks without consulting the ledger.

use crate::block::Block;
use crate::error::{LedgerError, LedgerResult};
use onyx_core::{Transaction, UInt256};
use std::collections::{HashSet, VecDeque};

/// Transaction hashes of the last `max_blocks` consecutive blocks.
#[derive(Debug, Clone)]
pub struct IncrementalValidator {
    blocks: VecDeque<HashSet<UInt256>>,
    base_height: u32,
    max_blocks: usize,
}

impl IncrementalValidator {
    pub fn new(max_blocks: usize) -> Self {
        Self {
            blocks: VecDeque::with_capacity(max_blocks),
            base_height: 0,
            max_blocks: max_blocks.max(1),
        }
    }

    /// Heights covered, as a half-open range `[start, end)`.
    pub fn block_range(&self) -> (u32, u32) {
        (self.base_height, self.base_height + self.blocks.len() as u32)
    }

    /// Appends a block. A gap in heights restarts the window at this block.
    pub fn add_block(&mut self, block: &Block) {
        let height = block.height();
        let (_, end) = self.block_range();
        if self.blocks.is_empty() || end != height {
            self.clean();
            self.base_height = height;
        }

        self.blocks
            .push_back(block.transactions.iter().map(Transaction::hash).collect());
        if self.blocks.len() > self.max_blocks {
            self.blocks.pop_front();
            self.base_height += 1;
        }
    }

    pub fn clean(&mut self) {
        self.blocks.clear();
        self.base_height = 0;
    }

    /// Rejects `tx` if a tracked block at or above `start_height` contains it.
    pub fn verify(&self, tx: &Transaction, start_height: u32) -> LedgerResult<()> {
        if self.blocks.is_empty() {
            return Ok(());
        }
        if start_height < self.base_height {
            return Err(LedgerError::OutsideWindow {
                base: self.base_height,
                requested: start_height,
            });
        }
        let hash = tx.hash();
        let skip = (start_height - self.base_height) as usize;
        if self.blocks.iter().skip(skip).any(|hashes| hashes.contains(&hash)) {
            return Err(LedgerError::DuplicateTransaction(hash));
        }
        Ok(())
    }

    /// The height from which a block proposed at `height` must be checked.
    ///
    /// Uses the window start when the window ends right below `height`;
    /// otherwise the window is stale, so it is cleared and `height` is used.
    pub fn valid_height_for(&mut self, height: u32) -> u32 {
        let (start, end) = self.block_range();
        if end == height && !self.blocks.is_empty() {
            start
        } else {
            self.clean();
            height
        }
    }
}
