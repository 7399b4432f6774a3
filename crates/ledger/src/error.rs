//! Ledger error types.

use onyx_core::{CoreError, UInt256};
use onyx_cryptography::CryptoError;
use onyx_io::IoError;
use thiserror::Error;

/// Errors raised while validating or persisting blocks and transactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The block failed validation.
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    /// A transaction failed validation.
    #[error("Invalid transaction {hash}: {reason}")]
    InvalidTransaction { hash: UInt256, reason: String },

    /// The block does not extend the current tip.
    #[error("Block height {actual} does not follow tip height {tip}")]
    HeightMismatch { tip: u32, actual: u32 },

    /// The transaction already appears in a recent block.
    #[error("Duplicate transaction {0}")]
    DuplicateTransaction(UInt256),

    /// The transaction is already in the pool.
    #[error("Transaction {0} already pooled")]
    AlreadyPooled(UInt256),

    /// The validator set could not be derived.
    #[error("Invalid validator set: {0}")]
    InvalidValidators(String),

    /// Requested validation range is no longer tracked.
    #[error("Validation window starts at {base}, requested {requested}")]
    OutsideWindow { base: u32, requested: u32 },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl LedgerError {
    pub fn invalid_block(message: impl Into<String>) -> Self {
        Self::InvalidBlock(message.into())
    }

    pub fn invalid_transaction(hash: UInt256, reason: impl Into<String>) -> Self {
        Self::InvalidTransaction {
            hash,
            reason: reason.into(),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
