use super::MAX_SIGNATURE_SIZE;
use onyx_core::{Transaction, UInt160};
use onyx_io::{helper, BinaryWriter, IoResult, MemoryReader, Serializable};
use onyx_ledger::block::MAX_TRANSACTIONS_PER_BLOCK;

/// The primary's block proposal.
///
/// Together with the payload timestamp and the context's previous hash and
/// height, these fields determine the header every bookkeeper signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareRequestMessage {
    pub view_number: u8,
    pub nonce: u64,
    pub next_bookkeeper: UInt160,
    /// Bookkeeping transaction first, then the primary's chosen order.
    pub transactions: Vec<Transaction>,
    /// The primary's signature over the header hash.
    pub signature: Vec<u8>,
}

impl PrepareRequestMessage {
    pub(crate) fn body_size(&self) -> usize {
        8 + self.next_bookkeeper.size()
            + helper::get_array_size(&self.transactions)
            + helper::get_var_bytes_size(&self.signature)
    }

    pub(crate) fn serialize_body(&self, writer: &mut BinaryWriter) {
        writer.write_u64(self.nonce);
        self.next_bookkeeper.serialize(writer);
        helper::serialize_array(&self.transactions, writer);
        writer.write_var_bytes(&self.signature);
    }

    pub(crate) fn deserialize_body(reader: &mut MemoryReader, view_number: u8) -> IoResult<Self> {
        Ok(Self {
            view_number,
            nonce: reader.read_u64()?,
            next_bookkeeper: UInt160::deserialize(reader)?,
            transactions: helper::deserialize_array(reader, MAX_TRANSACTIONS_PER_BLOCK)?,
            signature: reader.read_var_bytes(MAX_SIGNATURE_SIZE)?,
        })
    }
}
