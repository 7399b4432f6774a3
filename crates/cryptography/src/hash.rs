//! Hash functions used by the node.
//!
//! Hash160 (RIPEMD-160 of SHA-256) derives addresses. Hash256 (double
//! SHA-256) identifies transactions and block headers.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub use onyx_core::hash256;

/// Computes SHA-1 hash of the input data.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    use sha1::Sha1;
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes Hash160 (RIPEMD-160 of SHA-256) of the input data.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha1_abc() {
        assert_eq!(
            hex::encode(sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_ripemd160_empty() {
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    #[test]
    fn test_compound_hashes() {
        let data = b"onyx";
        assert_eq!(hash256(data), sha256(&sha256(data)));
        assert_eq!(hash160(data), ripemd160(&sha256(data)));
    }
}
