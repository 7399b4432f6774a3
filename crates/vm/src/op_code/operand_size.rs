//! Operand size information for opcodes.

/// How many operand bytes follow an opcode.
///
/// Either a fixed count, or a little-endian length prefix of
/// `size_prefix` bytes followed by that many data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSize {
    size: usize,
    size_prefix: usize,
}

impl OperandSize {
    /// Creates a new operand size with a fixed size.
    pub const fn fixed(size: usize) -> Self {
        Self {
            size,
            size_prefix: 0,
        }
    }

    /// Creates a new operand size with a size prefix.
    pub const fn prefix(size_prefix: usize) -> Self {
        Self {
            size: 0,
            size_prefix,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn size_prefix(&self) -> usize {
        self.size_prefix
    }
}
