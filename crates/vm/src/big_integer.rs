//! Integer encoding shared by every arithmetic opcode.
//!
//! Integers travel on the stack as little-endian two's-complement byte
//! strings of minimal length, with zero encoded as the empty string.
//! Operands and results are limited to [`MAX_INTEGER_SIZE`] bytes.

use crate::error::{VmError, VmResult};
use num_bigint::BigInt;
use num_traits::Zero;

/// Maximum size in bytes of an integer operand or result.
pub const MAX_INTEGER_SIZE: usize = 32;

/// Decodes a byte string as an integer.
pub fn from_bytes(bytes: &[u8]) -> VmResult<BigInt> {
    if bytes.len() > MAX_INTEGER_SIZE {
        return Err(VmError::IntegerTooLarge {
            size: bytes.len(),
            max: MAX_INTEGER_SIZE,
        });
    }
    if bytes.is_empty() {
        return Ok(BigInt::zero());
    }
    Ok(BigInt::from_signed_bytes_le(bytes))
}

/// Encodes an integer in minimal two's-complement form.
pub fn to_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_signed_bytes_le()
    }
}

/// Rejects values whose encoding exceeds [`MAX_INTEGER_SIZE`].
pub fn check_size(value: BigInt) -> VmResult<BigInt> {
    let size = to_bytes(&value).len();
    if size > MAX_INTEGER_SIZE {
        return Err(VmError::IntegerTooLarge {
            size,
            max: MAX_INTEGER_SIZE,
        });
    }
    Ok(value)
}
