//! A decoded instruction.

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;

/// One opcode together with its operand, decoded at `pointer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Script offset of the opcode byte.
    pub pointer: usize,
    pub opcode: OpCode,
    /// Operand data, without any length prefix.
    pub operand: Vec<u8>,
    /// Total encoded length including opcode and prefix.
    size: usize,
}

impl Instruction {
    /// Decodes the instruction starting at `pointer`.
    ///
    /// Fails on bytes outside the opcode set and on operands that run past
    /// the end of the script.
    pub fn decode(script: &[u8], pointer: usize) -> VmResult<Self> {
        let byte = *script
            .get(pointer)
            .ok_or(VmError::TruncatedOperand { position: pointer })?;
        let opcode = OpCode::from_byte(byte).ok_or(VmError::InvalidOpcode(byte))?;
        let operand_size = opcode.operand_size();

        let mut cursor = pointer + 1;
        let length = match operand_size.size_prefix() {
            0 => operand_size.size(),
            prefix => {
                let bytes = read(script, cursor, prefix)?;
                cursor += prefix;
                let mut buf = [0u8; 4];
                buf[..prefix].copy_from_slice(bytes);
                u32::from_le_bytes(buf) as usize
            }
        };
        let operand = read(script, cursor, length)?.to_vec();
        let size = cursor + length - pointer;

        Ok(Self {
            pointer,
            opcode,
            operand,
            size,
        })
    }

    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Encoded length in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset of the following instruction.
    #[inline]
    pub fn next_pointer(&self) -> usize {
        self.pointer + self.size
    }

    /// The signed 16-bit jump offset of a branch instruction.
    pub fn token_i16(&self) -> VmResult<i16> {
        match self.operand.as_slice() {
            [lo, hi] => Ok(i16::from_le_bytes([*lo, *hi])),
            _ => Err(VmError::TruncatedOperand {
                position: self.pointer + 1,
            }),
        }
    }
}

fn read(script: &[u8], start: usize, count: usize) -> VmResult<&[u8]> {
    start
        .checked_add(count)
        .and_then(|end| script.get(start..end))
        .ok_or(VmError::TruncatedOperand { position: start })
}
