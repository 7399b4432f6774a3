//! Block data structures.
//!
//! - header: the signed header and its hash
//! - builder: assembles blocks and computes the transactions root
//! - verification: multi-signature checks over the header hash

pub mod builder;
pub mod header;
pub mod verification;

pub use builder::BlockBuilder;
pub use header::Header;

use onyx_core::{Transaction, UInt256};
use onyx_cryptography::MerkleTree;
use onyx_io::{helper, BinaryWriter, IoResult, MemoryReader, Serializable};
use serde::{Deserialize, Serialize};

/// Maximum number of transactions accepted when decoding a block.
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 0xFFFF;

/// A header together with its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    #[inline]
    pub fn hash(&self) -> UInt256 {
        self.header.hash()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Recomputes the Merkle root of the transaction hashes.
    pub fn compute_transactions_root(&self) -> UInt256 {
        let hashes: Vec<UInt256> = self.transactions.iter().map(Transaction::hash).collect();
        MerkleTree::compute_root(&hashes)
    }
}

impl Serializable for Block {
    fn size(&self) -> usize {
        self.header.size() + helper::get_array_size(&self.transactions)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        Serializable::serialize(&self.header, writer);
        helper::serialize_array(&self.transactions, writer);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            header: <Header as Serializable>::deserialize(reader)?,
            transactions: helper::deserialize_array(reader, MAX_TRANSACTIONS_PER_BLOCK)?,
        })
    }
}
