//! Error types for core primitives.

use onyx_io::IoError;
use thiserror::Error;

/// Errors raised by primitive parsing and transaction decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid textual or binary format.
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Error message.
        message: String,
    },

    /// Unknown transaction type tag.
    #[error("Unknown transaction type: {0:#04x}")]
    UnknownTransactionType(u8),

    /// Decoding error from the codec.
    #[error(transparent)]
    Io(#[from] IoError),
}

impl CoreError {
    /// Creates an invalid format error.
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
