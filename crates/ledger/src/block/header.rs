//! Block header.

use onyx_core::{hash256, UInt160, UInt256};
use onyx_cryptography::PublicKey;
use onyx_io::{helper, BinaryWriter, IoResult, MemoryReader, Serializable};
use serde::{Deserialize, Serialize};

/// Largest bookkeeper list accepted when decoding a header.
pub const MAX_BOOKKEEPERS: usize = 1024;

/// Largest encoded signature accepted when decoding a header.
const MAX_SIGNATURE_SIZE: usize = 1024;

/// A block header.
///
/// The hash covers only the unsigned fields, so `bookkeepers` and
/// `sig_data` can be attached after every signer has signed the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub prev_hash: UInt256,
    pub transactions_root: UInt256,
    /// Seconds since the Unix epoch.
    pub timestamp: u32,
    pub height: u32,
    pub nonce: u64,
    /// Multi-signature address of the bookkeepers for the next block.
    pub next_bookkeeper: UInt160,
    /// The bookkeepers that produced this block, in index order.
    pub bookkeepers: Vec<PublicKey>,
    /// Signatures over [`Header::hash`], in bookkeeper order.
    pub sig_data: Vec<Vec<u8>>,
}

impl Header {
    /// Writes the fields covered by the hash.
    pub fn serialize_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u32(self.version);
        Serializable::serialize(&self.prev_hash, writer);
        Serializable::serialize(&self.transactions_root, writer);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.height);
        writer.write_u64(self.nonce);
        Serializable::serialize(&self.next_bookkeeper, writer);
    }

    /// The serialized fields covered by the hash.
    pub fn unsigned_data(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(Self::UNSIGNED_SIZE);
        self.serialize_unsigned(&mut writer);
        writer.into_bytes()
    }

    /// Hash256 of the unsigned fields.
    pub fn hash(&self) -> UInt256 {
        UInt256::from_array(hash256(&self.unsigned_data()))
    }

    const UNSIGNED_SIZE: usize = 4 + 32 + 32 + 4 + 4 + 8 + 20;

    fn deserialize_unsigned(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            version: reader.read_u32()?,
            prev_hash: <UInt256 as Serializable>::deserialize(reader)?,
            transactions_root: <UInt256 as Serializable>::deserialize(reader)?,
            timestamp: reader.read_u32()?,
            height: reader.read_u32()?,
            nonce: reader.read_u64()?,
            next_bookkeeper: <UInt160 as Serializable>::deserialize(reader)?,
            bookkeepers: Vec::new(),
            sig_data: Vec::new(),
        })
    }
}

impl Serializable for Header {
    fn size(&self) -> usize {
        Self::UNSIGNED_SIZE
            + helper::get_array_size(&self.bookkeepers)
            + helper::get_var_size(self.sig_data.len() as u64)
            + self
                .sig_data
                .iter()
                .map(|sig| helper::get_var_bytes_size(sig))
                .sum::<usize>()
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        self.serialize_unsigned(writer);
        helper::serialize_array(&self.bookkeepers, writer);
        writer.write_var_int(self.sig_data.len() as u64);
        for sig in &self.sig_data {
            writer.write_var_bytes(sig);
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let mut header = Self::deserialize_unsigned(reader)?;
        header.bookkeepers = helper::deserialize_array(reader, MAX_BOOKKEEPERS)?;
        let count = reader.read_var_int(MAX_BOOKKEEPERS as u64)? as usize;
        header.sig_data = (0..count)
            .map(|_| reader.read_var_bytes(MAX_SIGNATURE_SIZE))
            .collect::<IoResult<_>>()?;
        Ok(header)
    }
}
