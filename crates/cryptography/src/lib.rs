//! # Onyx Cryptography
//!
//! Hash functions, Merkle roots and secp256r1 keys used by the node.
//!
//! Signatures are 64-byte `r || s` ECDSA over SHA-256 of the message.
//! Public keys travel as 33-byte SEC1 compressed points.
//!
//! ```rust
//! use onyx_cryptography::{ECDsa, KeyPair};
//!
//! let keypair = KeyPair::generate();
//! let signature = keypair.sign(b"header");
//! assert!(ECDsa::verify(keypair.public_key(), b"header", &signature));
//! ```

pub mod ecc;
pub mod ecdsa;
pub mod error;
pub mod hash;
pub mod merkle;

pub use ecc::{KeyPair, PrivateKey, PublicKey, PUBLIC_KEY_SIZE};
pub use ecdsa::{ECDsa, SIGNATURE_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use merkle::MerkleTree;
