//! Multi-signature verification of block headers.

use super::header::Header;
use crate::error::{LedgerError, LedgerResult};
use crate::validator_selector::quorum;
use onyx_cryptography::{ECDsa, PublicKey};

/// Checks `signatures` against `keys` the way a multi-signature script does.
///
/// Signatures must appear in key order; each signature consumes keys until
/// one verifies it. At least `quorum(keys.len())` signatures are required.
pub fn verify_multisig(message: &[u8], keys: &[PublicKey], signatures: &[Vec<u8>]) -> bool {
    if keys.is_empty() || signatures.len() < quorum(keys.len()) || signatures.len() > keys.len() {
        return false;
    }
    let mut key_iter = keys.iter();
    'signatures: for signature in signatures {
        for key in key_iter.by_ref() {
            if ECDsa::verify(key, message, signature) {
                continue 'signatures;
            }
        }
        return false;
    }
    true
}

impl Header {
    /// Verifies that this header was produced by `expected` bookkeepers.
    ///
    /// Every signature is over the 32 bytes of [`Header::hash`].
    pub fn verify_witness(&self, expected: &[PublicKey]) -> LedgerResult<()> {
        if self.bookkeepers != expected {
            return Err(LedgerError::invalid_block(format!(
                "header at height {} lists {} bookkeepers that differ from the current set",
                self.height,
                self.bookkeepers.len()
            )));
        }
        if !verify_multisig(self.hash().as_bytes(), &self.bookkeepers, &self.sig_data) {
            return Err(LedgerError::invalid_block(format!(
                "header at height {} lacks a quorum of valid signatures",
                self.height
            )));
        }
        Ok(())
    }
}
