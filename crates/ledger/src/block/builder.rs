//! Block builder for constructing blocks.

use super::{Block, Header};
use onyx_core::{Transaction, UInt160, UInt256};
use onyx_cryptography::{MerkleTree, PublicKey};

/// Assembles a block and fills in its transactions root.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    version: u32,
    prev_hash: UInt256,
    timestamp: u32,
    height: u32,
    nonce: u64,
    next_bookkeeper: UInt160,
    transactions: Vec<Transaction>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn prev_hash(mut self, hash: UInt256) -> Self {
        self.prev_hash = hash;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn next_bookkeeper(mut self, address: UInt160) -> Self {
        self.next_bookkeeper = address;
        self
    }

    pub fn transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Builds the unsigned header; its hash is what bookkeepers sign.
    pub fn header(&self) -> Header {
        let hashes: Vec<UInt256> = self.transactions.iter().map(Transaction::hash).collect();
        Header {
            version: self.version,
            prev_hash: self.prev_hash,
            transactions_root: MerkleTree::compute_root(&hashes),
            timestamp: self.timestamp,
            height: self.height,
            nonce: self.nonce,
            next_bookkeeper: self.next_bookkeeper,
            bookkeepers: Vec::new(),
            sig_data: Vec::new(),
        }
    }

    /// Builds the block with the given witness attached.
    pub fn build(self, bookkeepers: Vec<PublicKey>, sig_data: Vec<Vec<u8>>) -> Block {
        let mut header = self.header();
        header.bookkeepers = bookkeepers;
        header.sig_data = sig_data;
        Block {
            header,
            transactions: self.transactions,
        }
    }
}
