use onyx_io::{BinaryWriter, IoResult, MemoryReader};

/// A vote to move the current height to `new_view_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeViewMessage {
    pub view_number: u8,
    pub new_view_number: u8,
}

impl ChangeViewMessage {
    pub fn new(view_number: u8, new_view_number: u8) -> Self {
        Self {
            view_number,
            new_view_number,
        }
    }

    pub(crate) fn body_size(&self) -> usize {
        1
    }

    pub(crate) fn serialize_body(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.new_view_number);
    }

    pub(crate) fn deserialize_body(reader: &mut MemoryReader, view_number: u8) -> IoResult<Self> {
        Ok(Self {
            view_number,
            new_view_number: reader.read_u8()?,
        })
    }
}
