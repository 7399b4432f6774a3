//! Bookkeeper set transitions.
//!
//! The header of every block commits to the next bookkeeper set through
//! [`address_from_bookkeepers`]; a [`ValidatorSelector`] decides what that
//! set is from the block's transactions.

use crate::error::{LedgerError, LedgerResult};
use onyx_core::{Transaction, TransactionType, UInt160};
use onyx_cryptography::{hash, PublicKey};
use onyx_vm::ScriptBuilder;

/// Opcode byte that ends a multi-signature verification script.
///
/// The script is only hashed into an address and never run, so this byte
/// stays out of `OpCode`, where it would need a handler.
const CHECKMULTISIG: u8 = 0xAE;

/// Number of signatures needed from `n` bookkeepers: `n - (n - 1) / 3`.
pub fn quorum(n: usize) -> usize {
    n - n.saturating_sub(1) / 3
}

/// Builds the M-of-n verification script over `keys`, sorted.
pub fn multisig_redeem_script(keys: &[PublicKey]) -> LedgerResult<Vec<u8>> {
    if keys.is_empty() {
        return Err(LedgerError::InvalidValidators("empty bookkeeper set".into()));
    }
    let mut sorted = keys.to_vec();
    sorted.sort();

    let mut builder = ScriptBuilder::new();
    builder.emit_push_int(quorum(sorted.len()) as i64);
    for key in &sorted {
        builder.emit_push_bytes(key.as_bytes());
    }
    builder.emit_push_int(sorted.len() as i64).emit(CHECKMULTISIG);
    Ok(builder.to_array())
}

/// The address committed to in `next_bookkeeper`: Hash160 of the redeem script.
pub fn address_from_bookkeepers(keys: &[PublicKey]) -> LedgerResult<UInt160> {
    let script = multisig_redeem_script(keys)?;
    Ok(UInt160::from_array(hash::hash160(&script)))
}

/// Derives the bookkeepers of the next block from the current block's contents.
pub trait ValidatorSelector: Send + Sync {
    fn next_bookkeepers(
        &self,
        current: &[PublicKey],
        transactions: &[Transaction],
    ) -> LedgerResult<Vec<PublicKey>>;
}

/// The last `Vote` transaction in a block names the next set; without one
/// the current set carries over.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoteValidatorSelector;

impl ValidatorSelector for VoteValidatorSelector {
    fn next_bookkeepers(
        &self,
        current: &[PublicKey],
        transactions: &[Transaction],
    ) -> LedgerResult<Vec<PublicKey>> {
        let Some(vote) = transactions
            .iter()
            .rev()
            .find(|tx| tx.tx_type == TransactionType::Vote)
        else {
            return Ok(current.to_vec());
        };

        let mut keys = vote
            .vote_keys()?
            .iter()
            .map(|bytes| PublicKey::from_bytes(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
