use super::MAX_SIGNATURE_SIZE;
use onyx_io::{helper, BinaryWriter, IoResult, MemoryReader, Serializable};

/// Upper bound on entries, matching the bookkeeper limit of a header.
const MAX_ENTRIES: usize = 1024;

/// One bookkeeper's signature, addressed by its index in the bookkeeper list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    pub index: u16,
    pub signature: Vec<u8>,
}

impl Serializable for SignatureEntry {
    fn size(&self) -> usize {
        2 + helper::get_var_bytes_size(&self.signature)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.index);
        writer.write_var_bytes(&self.signature);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            index: reader.read_u16()?,
            signature: reader.read_var_bytes(MAX_SIGNATURE_SIZE)?,
        })
    }
}

/// The quorum of signatures that finalized a block, relayed so that peers
/// behind on responses can finish without another prepare round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSignaturesMessage {
    pub view_number: u8,
    pub signatures: Vec<SignatureEntry>,
}

impl BlockSignaturesMessage {
    pub(crate) fn body_size(&self) -> usize {
        helper::get_array_size(&self.signatures)
    }

    pub(crate) fn serialize_body(&self, writer: &mut BinaryWriter) {
        helper::serialize_array(&self.signatures, writer);
    }

    pub(crate) fn deserialize_body(reader: &mut MemoryReader, view_number: u8) -> IoResult<Self> {
        Ok(Self {
            view_number,
            signatures: helper::deserialize_array(reader, MAX_ENTRIES)?,
        })
    }
}
