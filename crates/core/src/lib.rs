//! # Onyx Core
//!
//! Fundamental chain types shared by the interpreter, the ledger and the
//! consensus service.
//!
//! - [`UInt256`]: 32-byte hash (block and transaction identifiers).
//! - [`UInt160`]: 20-byte address (script hashes, next-bookkeeper address).
//! - [`Transaction`]: the unit of work carried in a block.
//!
//! ## Example
//!
//! ```rust
//! use onyx_core::{Transaction, TransactionType, UInt256};
//!
//! let tx = Transaction::bookkeeping(42);
//! assert_eq!(tx.tx_type, TransactionType::Bookkeeping);
//! assert_ne!(tx.hash(), UInt256::zero());
//! ```

pub mod error;
pub mod transaction;
pub mod uint160;
pub mod uint256;

pub use error::{CoreError, CoreResult};
pub use transaction::{Transaction, TransactionType, MAX_TRANSACTION_PAYLOAD, PUBLIC_KEY_SIZE};
pub use uint160::UInt160;
pub use uint256::UInt256;

/// Computes SHA-256(SHA-256(data)), the identifier hash used for
/// transactions and block headers.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}
