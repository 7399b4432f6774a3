//! Error types for the interpreter.
//!
//! Every variant ends the current run in `FAULT`; none of them propagate
//! past [`crate::ExecutionEngine::execute`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// An operation needed more items than the stack holds.
    #[error("Stack underflow: needed {needed}, have {available}")]
    StackUnderflow { needed: usize, available: usize },

    /// A push would exceed the stack limit.
    #[error("Stack overflow: limit {limit}")]
    StackOverflow { limit: usize },

    /// Too many nested calls.
    #[error("Invocation stack overflow: limit {limit}")]
    InvocationStackOverflow { limit: usize },

    #[error("Invalid opcode {0:#04x}")]
    InvalidOpcode(u8),

    /// No handler is registered for a known opcode.
    #[error("Unsupported opcode {0}")]
    UnsupportedOpcode(&'static str),

    /// The script ended inside an operand.
    #[error("Truncated operand at position {position}")]
    TruncatedOperand { position: usize },

    #[error("Jump target {target} outside script of length {length}")]
    InvalidJump { target: isize, length: usize },

    /// A value had the wrong type for the operation.
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// An integer operand or result exceeded the size limit.
    #[error("Integer of {size} bytes exceeds limit of {max}")]
    IntegerTooLarge { size: usize, max: usize },

    #[error("Division by zero")]
    DivisionByZero,

    /// An index, count or shift was outside the permitted range.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// A byte string exceeded the item size limit.
    #[error("Item of {size} bytes exceeds limit of {max}")]
    ItemTooLarge { size: usize, max: usize },

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Script raised THROW")]
    Throw,

    /// Called when no script is loaded.
    #[error("No execution context")]
    NoContext,
}

impl VmError {
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::InvalidType(message.into())
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange(message.into())
    }
}

pub type VmResult<T> = Result<T, VmError>;
