//! # Onyx Ledger
//!
//! Blocks, the chain store, and the transaction pool the consensus service
//! draws proposals from.
//!
//! ## Components
//!
//! - **Block**: header, transactions and multi-signature witness checks
//! - **Ledger**: the append-only chain behind the [`Ledger`] trait
//! - **TxPool**: pending transactions and block re-verification
//! - **IncrementalValidator**: duplicate detection across a window of recent blocks
//! - **ValidatorSelector**: derives the next bookkeeper set from a block

pub mod block;
pub mod error;
pub mod execution;
pub mod incremental;
pub mod ledger;
pub mod tx_pool;
pub mod validator_selector;

pub use block::{Block, BlockBuilder, Header};
pub use error::{LedgerError, LedgerResult};
pub use execution::{execute_block, execute_transaction, ExecutionResult};
pub use incremental::IncrementalValidator;
pub use ledger::{genesis_block, Ledger, MemoryLedger};
pub use tx_pool::{check_transaction, MemoryPool, MempoolConfig, TxPool};
pub use validator_selector::{
    address_from_bookkeepers, multisig_redeem_script, quorum, ValidatorSelector,
    VoteValidatorSelector,
};
