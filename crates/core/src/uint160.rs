//! Implementation of `UInt160`, the 20-byte address type.

use crate::error::{CoreError, CoreResult};
use onyx_io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The length of `UInt160` values in bytes.
pub const UINT160_SIZE: usize = 20;

/// A 160-bit script hash. Used as the next-bookkeeper address of a block.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UInt160([u8; UINT160_SIZE]);

impl UInt160 {
    pub const LENGTH: usize = UINT160_SIZE;

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; UINT160_SIZE])
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; UINT160_SIZE]
    }

    #[inline]
    #[must_use]
    pub const fn from_array(bytes: [u8; UINT160_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a value from a byte slice of exactly 20 bytes.
    pub fn from_bytes(value: &[u8]) -> CoreResult<Self> {
        if value.len() != UINT160_SIZE {
            return Err(CoreError::invalid_format(format!(
                "Invalid UInt160 length: {}",
                value.len()
            )));
        }
        let mut bytes = [0u8; UINT160_SIZE];
        bytes.copy_from_slice(value);
        Ok(Self(bytes))
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; UINT160_SIZE] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn to_array(&self) -> [u8; UINT160_SIZE] {
        self.0
    }

    /// Parses a big-endian hex string with optional `0x` prefix.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let digits = s.trim_start_matches("0x");
        if digits.len() != UINT160_SIZE * 2 {
            return Err(CoreError::invalid_format(format!(
                "Invalid UInt160 hex length: {}",
                digits.len()
            )));
        }
        let mut bytes =
            hex::decode(digits).map_err(|e| CoreError::invalid_format(e.to_string()))?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }

    #[must_use]
    pub fn to_hex_string(&self) -> String {
        let reversed: Vec<u8> = self.0.iter().rev().copied().collect();
        format!("0x{}", hex::encode(reversed))
    }
}

impl fmt::Display for UInt160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl fmt::Debug for UInt160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UInt160({})", self.to_hex_string())
    }
}

impl FromStr for UInt160 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; UINT160_SIZE]> for UInt160 {
    fn from(bytes: [u8; UINT160_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Serializable for UInt160 {
    fn size(&self) -> usize {
        UINT160_SIZE
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(&self.0);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        reader.read_array::<UINT160_SIZE>().map(Self)
    }
}

impl Serialize for UInt160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for UInt160 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
