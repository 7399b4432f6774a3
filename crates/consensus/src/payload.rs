//! The signed envelope carrying a consensus message between bookkeepers.

use crate::messages::{ConsensusMessage, MAX_SIGNATURE_SIZE};
use crate::ConsensusResult;
use onyx_core::UInt256;
use onyx_cryptography::{ECDsa, KeyPair, PublicKey};
use onyx_io::{helper, BinaryWriter, IoResult, MemoryReader, Serializable};

/// Largest message accepted in a payload.
pub const MAX_PAYLOAD_DATA: usize = 16 * 1024 * 1024;

/// Size of the fixed fields before `data`.
const FIXED_SIZE: usize = 4 + 32 + 4 + 2 + 4;

/// A consensus message addressed to one height of one chain.
///
/// The signature covers every field except itself and is made with the key
/// of `bookkeepers[bookkeeper_index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusPayload {
    pub version: u32,
    pub prev_hash: UInt256,
    pub height: u32,
    pub bookkeeper_index: u16,
    pub timestamp: u32,
    /// An encoded [`ConsensusMessage`].
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ConsensusPayload {
    pub fn serialize_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u32(self.version);
        self.prev_hash.serialize(writer);
        writer.write_u32(self.height);
        writer.write_u16(self.bookkeeper_index);
        writer.write_u32(self.timestamp);
        writer.write_var_bytes(&self.data);
    }

    /// The bytes the signature is made over.
    pub fn unsigned_data(&self) -> Vec<u8> {
        let mut writer =
            BinaryWriter::with_capacity(FIXED_SIZE + helper::get_var_bytes_size(&self.data));
        self.serialize_unsigned(&mut writer);
        writer.into_bytes()
    }

    pub fn sign(&mut self, keypair: &KeyPair) {
        self.signature = keypair.sign(&self.unsigned_data()).to_vec();
    }

    pub fn verify(&self, key: &PublicKey) -> bool {
        ECDsa::verify(key, &self.unsigned_data(), &self.signature)
    }

    /// Decodes the carried message.
    pub fn message(&self) -> ConsensusResult<ConsensusMessage> {
        ConsensusMessage::from_bytes(&self.data)
    }
}

impl Serializable for ConsensusPayload {
    fn size(&self) -> usize {
        FIXED_SIZE
            + helper::get_var_bytes_size(&self.data)
            + helper::get_var_bytes_size(&self.signature)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        self.serialize_unsigned(writer);
        writer.write_var_bytes(&self.signature);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            version: reader.read_u32()?,
            prev_hash: UInt256::deserialize(reader)?,
            height: reader.read_u32()?,
            bookkeeper_index: reader.read_u16()?,
            timestamp: reader.read_u32()?,
            data: reader.read_var_bytes(MAX_PAYLOAD_DATA)?,
            signature: reader.read_var_bytes(MAX_SIGNATURE_SIZE)?,
        })
    }
}
