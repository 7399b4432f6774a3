use super::MAX_SIGNATURE_SIZE;
use onyx_io::{helper, BinaryWriter, IoResult, MemoryReader};

/// A backup's signature over the proposed header hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareResponseMessage {
    pub view_number: u8,
    pub signature: Vec<u8>,
}

impl PrepareResponseMessage {
    pub(crate) fn body_size(&self) -> usize {
        helper::get_var_bytes_size(&self.signature)
    }

    pub(crate) fn serialize_body(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.signature);
    }

    pub(crate) fn deserialize_body(reader: &mut MemoryReader, view_number: u8) -> IoResult<Self> {
        Ok(Self {
            view_number,
            signature: reader.read_var_bytes(MAX_SIGNATURE_SIZE)?,
        })
    }
}
