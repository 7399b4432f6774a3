//! Transaction module.
//!
//! - `core` - the `Transaction` struct, its type tag and constructors
//! - `serialization` - wire codec and the vote payload format

pub mod core;
pub mod serialization;

pub use self::core::{Transaction, TransactionType, MAX_TRANSACTION_PAYLOAD, PUBLIC_KEY_SIZE};
