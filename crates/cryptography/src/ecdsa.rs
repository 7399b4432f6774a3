//! ECDSA signing and verification over secp256r1.

use crate::ecc::{PrivateKey, PublicKey};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::Signature;

/// Length of an `r || s` signature.
pub const SIGNATURE_SIZE: usize = 64;

/// ECDSA implementation for the node.
pub struct ECDsa;

impl ECDsa {
    /// Signs SHA-256(`data`) with RFC 6979 deterministic nonces.
    pub fn sign(data: &[u8], private_key: &PrivateKey) -> [u8; SIGNATURE_SIZE] {
        let signature: Signature = private_key.signing_key().sign(data);
        let mut out = [0u8; SIGNATURE_SIZE];
        out.copy_from_slice(&signature.to_bytes());
        out
    }

    /// Verifies a 64-byte signature. Malformed signatures verify as false.
    pub fn verify(public_key: &PublicKey, data: &[u8], signature: &[u8]) -> bool {
        if signature.len() != SIGNATURE_SIZE {
            return false;
        }
        match Signature::from_slice(signature) {
            Ok(sig) => public_key.verifying_key().verify(data, &sig).is_ok(),
            Err(_) => false,
        }
    }

    /// Verifies against an encoded public key.
    ///
    /// Returns `None` when the key itself does not decode.
    pub fn verify_encoded(public_key: &[u8], data: &[u8], signature: &[u8]) -> Option<bool> {
        let key = PublicKey::from_bytes(public_key).ok()?;
        Some(Self::verify(&key, data, signature))
    }
}
