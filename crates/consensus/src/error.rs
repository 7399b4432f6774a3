//! Error types for consensus operations.
//!
//! Most of these never leave the service: a payload that fails a check is
//! logged and dropped at the dispatch boundary.
//!
//! ## Example
//!
//! ```rust
//! use onyx_consensus::ConsensusError;
//!
//! let err = ConsensusError::invalid_proposal("timestamp in the future");
//! assert!(err.to_string().contains("Invalid block proposal"));
//! ```

use onyx_io::IoError;
use onyx_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during consensus operations.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Payload for another height, chain tip or protocol version.
    #[error("Message from wrong block: expected height {expected}, got {got}")]
    WrongBlock { expected: u32, got: u32 },

    #[error("Invalid view: expected {expected}, got {actual}")]
    InvalidView { expected: u8, actual: u8 },

    /// Invalid block proposal.
    #[error("Invalid block proposal: {message}")]
    InvalidProposal { message: String },

    #[error("Signature verification failed: {message}")]
    SignatureVerificationFailed { message: String },

    #[error("Invalid validator index: {0}")]
    InvalidValidatorIndex(u16),

    #[error("Unknown consensus message type: {0:#04x}")]
    UnknownMessageType(u8),

    /// This node holds no bookkeeper key for the current height.
    #[error("Not a validator")]
    NotValidator,

    #[error("Consensus timeout: {phase}")]
    Timeout { phase: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State error: {message}")]
    StateError { message: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl ConsensusError {
    pub fn invalid_proposal(message: impl Into<String>) -> Self {
        Self::InvalidProposal {
            message: message.into(),
        }
    }

    pub fn signature_failed(message: impl Into<String>) -> Self {
        Self::SignatureVerificationFailed {
            message: message.into(),
        }
    }

    pub fn state_error(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    pub fn timeout(phase: impl Into<String>) -> Self {
        Self::Timeout {
            phase: phase.into(),
        }
    }
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ConsensusError::WrongBlock {
            expected: 10,
            got: 9,
        };
        assert_eq!(
            err.to_string(),
            "Message from wrong block: expected height 10, got 9"
        );
        assert_eq!(
            ConsensusError::UnknownMessageType(0x7f).to_string(),
            "Unknown consensus message type: 0x7f"
        );
    }

    #[test]
    fn test_ledger_errors_convert() {
        let err: ConsensusError = LedgerError::invalid_block("stale").into();
        assert!(matches!(err, ConsensusError::Ledger(_)));
    }
}
