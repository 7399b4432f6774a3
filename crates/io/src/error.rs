//! Error types for binary encoding and decoding.

use thiserror::Error;

/// Errors raised while reading or writing binary data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IoError {
    /// The input ended before the requested value could be read.
    #[error("Unexpected end of stream while reading {entity} at position {position}")]
    EndOfStream {
        /// Reader position at the time of the failure.
        position: usize,
        /// What was being read.
        entity: &'static str,
    },

    /// A variable-length value exceeded the caller supplied maximum.
    #[error("Value {value} exceeds maximum {max}")]
    ExceedsMaximum {
        /// The decoded value.
        value: u64,
        /// The permitted maximum.
        max: u64,
    },

    /// The input is structurally invalid.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl IoError {
    /// Creates an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Creates an end of stream error.
    pub fn end_of_stream(position: usize, entity: &'static str) -> Self {
        Self::EndOfStream { position, entity }
    }
}

/// Result type for IO operations.
pub type IoResult<T> = Result<T, IoError>;
