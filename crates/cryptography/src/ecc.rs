//! secp256r1 keys.

use crate::error::{CryptoError, CryptoResult};
use onyx_io::{BinaryWriter, IoError, IoResult, MemoryReader, Serializable};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Length of a SEC1 compressed public key.
pub const PUBLIC_KEY_SIZE: usize = 33;

/// A validated secp256r1 public key, kept in compressed form.
///
/// Ordering compares the compressed encoding, which fixes the order of the
/// next-bookkeeper set.
#[derive(Clone)]
pub struct PublicKey {
    encoded: [u8; PUBLIC_KEY_SIZE],
    key: VerifyingKey,
}

impl PublicKey {
    /// Decodes a SEC1 point (compressed or uncompressed) and checks it is on the curve.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("Invalid public key: {e}")))?;
        Ok(Self::from_verifying_key(key))
    }

    fn from_verifying_key(key: VerifyingKey) -> Self {
        let point = key.as_affine().to_encoded_point(true);
        let mut encoded = [0u8; PUBLIC_KEY_SIZE];
        encoded.copy_from_slice(point.as_bytes());
        Self { encoded, key }
    }

    /// The compressed encoding.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.encoded
    }

    #[inline]
    pub fn to_array(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.encoded
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }

    pub fn to_hex_string(&self) -> String {
        hex::encode(self.encoded)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.encoded.cmp(&other.encoded)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex_string())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serializable for PublicKey {
    fn size(&self) -> usize {
        PUBLIC_KEY_SIZE
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(&self.encoded);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let bytes = reader.read_array::<PUBLIC_KEY_SIZE>()?;
        Self::from_bytes(&bytes).map_err(|e| IoError::invalid_data(e.to_string()))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A secp256r1 private scalar.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Creates a private key from its 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(format!("Invalid private key: {e}")))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.0.verifying_key().clone())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A private key with its derived public key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generates a fresh random key pair.
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey(SigningKey::random(&mut OsRng)))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Builds a key pair from a hex encoded 32-byte private scalar.
    pub fn from_hex(private_key: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self::from_private_key(PrivateKey::from_bytes(&bytes)?))
    }

    #[inline]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    #[inline]
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Signs `message` with this pair's private key.
    pub fn sign(&self, message: &[u8]) -> [u8; crate::SIGNATURE_SIZE] {
        crate::ECDsa::sign(message, &self.private_key)
    }
}
