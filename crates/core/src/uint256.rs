//! Implementation of `UInt256`, the 32-byte hash type.

use crate::error::{CoreError, CoreResult};
use onyx_io::{IoResult, MemoryReader, Serializable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The length of `UInt256` values in bytes.
pub const UINT256_SIZE: usize = 32;

/// A 256-bit value stored little-endian, used for block and transaction hashes.
///
/// The textual form is `0x` followed by the big-endian hex digits, so the
/// bytes are reversed when formatting and parsing.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UInt256([u8; UINT256_SIZE]);

impl UInt256 {
    /// Alias for the byte length.
    pub const LENGTH: usize = UINT256_SIZE;

    /// Returns the all-zero value.
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; UINT256_SIZE])
    }

    /// Checks if this value is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Wraps a fixed-size array.
    #[inline]
    #[must_use]
    pub const fn from_array(bytes: [u8; UINT256_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a value from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidFormat` if the slice is not exactly 32 bytes.
    pub fn from_bytes(value: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; UINT256_SIZE] = value.try_into().map_err(|_| {
            CoreError::invalid_format(format!("Invalid UInt256 length: {}", value.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Returns the little-endian bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; UINT256_SIZE] {
        &self.0
    }

    /// Returns a copy of the little-endian bytes.
    #[inline]
    #[must_use]
    pub fn to_array(&self) -> [u8; UINT256_SIZE] {
        self.0
    }

    /// Parses a `UInt256` from a hexadecimal string with optional `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidFormat` if the input is not 64 hex digits.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if s.len() != UINT256_SIZE * 2 {
            return Err(CoreError::invalid_format(format!(
                "Invalid UInt256 hex length: {}",
                s.len()
            )));
        }
        let mut bytes = hex::decode(s).map_err(|e| CoreError::invalid_format(e.to_string()))?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }

    /// Converts the value to its `0x`-prefixed big-endian hex form.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        format!("0x{}", hex::encode(bytes))
    }
}

impl fmt::Display for UInt256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl fmt::Debug for UInt256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UInt256({})", self.to_hex_string())
    }
}

impl FromStr for UInt256 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; UINT256_SIZE]> for UInt256 {
    fn from(bytes: [u8; UINT256_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Serializable for UInt256 {
    fn size(&self) -> usize {
        UINT256_SIZE
    }

    fn serialize(&self, writer: &mut onyx_io::BinaryWriter) {
        writer.write_bytes(&self.0);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self(reader.read_array::<UINT256_SIZE>()?))
    }
}

impl Serialize for UInt256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for UInt256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_io::SerializableExt;

    #[test]
    fn test_parse_reverses_bytes() {
        let text = "0x0000000000000000000000000000000000000000000000000000000000000001";
        let value = UInt256::parse(text).unwrap();
        assert_eq!(value.as_bytes()[0], 1);
        assert_eq!(value.to_string(), text);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(UInt256::parse("0x1234").is_err());
        assert!(UInt256::parse(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_from_bytes_length() {
        assert!(UInt256::from_bytes(&[0u8; 31]).is_err());
        assert!(UInt256::from_bytes(&[0u8; 32]).unwrap().is_zero());
    }

    #[test]
    fn test_wire_encoding_is_raw_bytes() {
        let value = UInt256::from_array([7u8; 32]);
        assert_eq!(value.to_array().to_vec(), SerializableExt::to_array(&value));
    }
}
