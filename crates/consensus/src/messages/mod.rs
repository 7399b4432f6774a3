//! Consensus message definitions.
//!
//! Every message is encoded as `type u8 | view_number u8 | body`, so the
//! type and view can be read before the body is parsed.

mod block_signatures;
mod change_view;
mod prepare_request;
mod prepare_response;

pub use block_signatures::{BlockSignaturesMessage, SignatureEntry};
pub use change_view::ChangeViewMessage;
pub use prepare_request::PrepareRequestMessage;
pub use prepare_response::PrepareResponseMessage;

use crate::{ConsensusError, ConsensusMessageType, ConsensusResult};
use onyx_io::{BinaryWriter, IoError, MemoryReader};

/// Largest signature accepted when decoding.
pub(crate) const MAX_SIGNATURE_SIZE: usize = 0xFF;

/// A decoded consensus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusMessage {
    ChangeView(ChangeViewMessage),
    PrepareRequest(PrepareRequestMessage),
    PrepareResponse(PrepareResponseMessage),
    BlockSignatures(BlockSignaturesMessage),
}

impl ConsensusMessage {
    pub fn message_type(&self) -> ConsensusMessageType {
        match self {
            Self::ChangeView(_) => ConsensusMessageType::ChangeView,
            Self::PrepareRequest(_) => ConsensusMessageType::PrepareRequest,
            Self::PrepareResponse(_) => ConsensusMessageType::PrepareResponse,
            Self::BlockSignatures(_) => ConsensusMessageType::BlockSignatures,
        }
    }

    pub fn view_number(&self) -> u8 {
        match self {
            Self::ChangeView(m) => m.view_number,
            Self::PrepareRequest(m) => m.view_number,
            Self::PrepareResponse(m) => m.view_number,
            Self::BlockSignatures(m) => m.view_number,
        }
    }

    fn body_size(&self) -> usize {
        match self {
            Self::ChangeView(m) => m.body_size(),
            Self::PrepareRequest(m) => m.body_size(),
            Self::PrepareResponse(m) => m.body_size(),
            Self::BlockSignatures(m) => m.body_size(),
        }
    }

    /// Encodes the message for a payload's `data` field.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(2 + self.body_size());
        writer.write_u8(self.message_type().to_byte());
        writer.write_u8(self.view_number());
        match self {
            Self::ChangeView(m) => m.serialize_body(&mut writer),
            Self::PrepareRequest(m) => m.serialize_body(&mut writer),
            Self::PrepareResponse(m) => m.serialize_body(&mut writer),
            Self::BlockSignatures(m) => m.serialize_body(&mut writer),
        }
        writer.into_bytes()
    }

    /// Reads the type and view number without decoding the body.
    pub fn peek_header(data: &[u8]) -> ConsensusResult<(ConsensusMessageType, u8)> {
        let mut reader = MemoryReader::new(data);
        let tag = reader.read_u8()?;
        let ty = ConsensusMessageType::from_byte(tag).ok_or(ConsensusError::UnknownMessageType(tag))?;
        Ok((ty, reader.read_u8()?))
    }

    /// Decodes a payload's `data` field, rejecting trailing bytes.
    pub fn from_bytes(data: &[u8]) -> ConsensusResult<Self> {
        let (ty, view) = Self::peek_header(data)?;
        let mut reader = MemoryReader::new(data);
        reader.read_bytes(2)?;

        let message = match ty {
            ConsensusMessageType::ChangeView => {
                Self::ChangeView(ChangeViewMessage::deserialize_body(&mut reader, view)?)
            }
            ConsensusMessageType::PrepareRequest => {
                Self::PrepareRequest(PrepareRequestMessage::deserialize_body(&mut reader, view)?)
            }
            ConsensusMessageType::PrepareResponse => {
                Self::PrepareResponse(PrepareResponseMessage::deserialize_body(&mut reader, view)?)
            }
            ConsensusMessageType::BlockSignatures => {
                Self::BlockSignatures(BlockSignaturesMessage::deserialize_body(&mut reader, view)?)
            }
        };

        if !reader.is_empty() {
            return Err(IoError::invalid_data(format!(
                "{} trailing bytes after {ty} message",
                reader.remaining()
            ))
            .into());
        }
        Ok(message)
    }
}
