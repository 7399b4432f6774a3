//! Interpreter run state.

use std::fmt;

/// Indicates the status of the VM.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VMState {
    /// Execution is in progress or has not yet begun.
    NONE = 0,

    /// The outermost frame returned.
    HALT = 1 << 0,

    /// The run ended on an error. Only this transaction fails.
    FAULT = 1 << 1,

    /// Stopped after a single step.
    BREAK = 1 << 2,
}

impl VMState {
    #[inline]
    pub fn is_halt(self) -> bool {
        self == VMState::HALT
    }

    #[inline]
    pub fn is_fault(self) -> bool {
        self == VMState::FAULT
    }

    /// HALT or FAULT; no further instructions will run.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, VMState::HALT | VMState::FAULT)
    }
}

impl fmt::Display for VMState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VMState::NONE => "NONE",
            VMState::HALT => "HALT",
            VMState::FAULT => "FAULT",
            VMState::BREAK => "BREAK",
        };
        f.write_str(name)
    }
}
