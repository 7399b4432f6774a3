//! Programmatic script construction.

use crate::big_integer;
use crate::op_code::OpCode;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Helps construct VM scripts programmatically.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a single raw byte.
    pub fn emit(&mut self, byte: u8) -> &mut Self {
        self.script.push(byte);
        self
    }

    pub fn emit_opcode(&mut self, opcode: OpCode) -> &mut Self {
        self.emit(opcode as u8)
    }

    /// Emits the shortest push instruction for `data`.
    pub fn emit_push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len == 0 {
            return self.emit_opcode(OpCode::PUSH0);
        }
        if len <= OpCode::PUSHBYTES75 as usize {
            self.emit(len as u8);
        } else if len <= u8::MAX as usize {
            self.emit_opcode(OpCode::PUSHDATA1);
            self.emit(len as u8);
        } else if len <= u16::MAX as usize {
            self.emit_opcode(OpCode::PUSHDATA2);
            self.script.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.emit_opcode(OpCode::PUSHDATA4);
            self.script.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    /// Emits an integer push, using the one-byte forms for -1 through 16.
    pub fn emit_push_int<T: Into<BigInt>>(&mut self, value: T) -> &mut Self {
        let value = value.into();
        match value.to_i64() {
            Some(-1) => self.emit_opcode(OpCode::PUSHM1),
            Some(0) => self.emit_opcode(OpCode::PUSH0),
            Some(n @ 1..=16) => self.emit(OpCode::PUSH1 as u8 + (n as u8) - 1),
            _ => self.emit_push_bytes(&big_integer::to_bytes(&value)),
        }
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit_opcode(if value { OpCode::PUSH1 } else { OpCode::PUSH0 })
    }

    /// Emits a branch with a signed offset relative to the branch opcode.
    pub fn emit_jump(&mut self, opcode: OpCode, offset: i16) -> &mut Self {
        self.emit_opcode(opcode);
        self.script.extend_from_slice(&offset.to_le_bytes());
        self
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Returns a copy of the script built so far.
    pub fn to_array(&self) -> Vec<u8> {
        self.script.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_integers_use_single_byte() {
        let script = ScriptBuilder::new()
            .emit_push_int(-1)
            .emit_push_int(0)
            .emit_push_int(1)
            .emit_push_int(16)
            .to_array();
        assert_eq!(script, vec![0x4F, 0x00, 0x51, 0x60]);
    }

    #[test]
    fn test_larger_integers_push_bytes() {
        let script = ScriptBuilder::new().emit_push_int(17).to_array();
        assert_eq!(script, vec![0x01, 0x11]);
        let script = ScriptBuilder::new().emit_push_int(-2).to_array();
        assert_eq!(script, vec![0x01, 0xFE]);
    }

    #[test]
    fn test_push_data_prefixes() {
        assert_eq!(ScriptBuilder::new().emit_push_bytes(&[7; 75]).to_array()[0], 75);

        let script = ScriptBuilder::new().emit_push_bytes(&[7; 76]).to_array();
        assert_eq!(&script[..2], &[0x4C, 76]);
        assert_eq!(script.len(), 78);

        let script = ScriptBuilder::new().emit_push_bytes(&[7; 256]).to_array();
        assert_eq!(&script[..3], &[0x4D, 0x00, 0x01]);

        let script = ScriptBuilder::new().emit_push_bytes(&vec![7; 0x10000]).to_array();
        assert_eq!(&script[..5], &[0x4E, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_jump_encoding() {
        let script = ScriptBuilder::new().emit_jump(OpCode::JMPIF, -3).to_array();
        assert_eq!(script, vec![0x63, 0xFD, 0xFF]);
    }
}
