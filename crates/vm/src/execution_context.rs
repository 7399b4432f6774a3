//! Execution context: one frame of the invocation stack.

use crate::error::VmResult;
use crate::instruction::Instruction;
use std::sync::Arc;

/// A script and the position of the next instruction to run in it.
///
/// Cloning shares the script bytes; `CALL` relies on this to save the
/// caller's frame cheaply.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    script: Arc<[u8]>,
    instruction_pointer: usize,
}

impl ExecutionContext {
    pub fn new(script: impl Into<Arc<[u8]>>) -> Self {
        Self {
            script: script.into(),
            instruction_pointer: 0,
        }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn set_instruction_pointer(&mut self, position: usize) {
        self.instruction_pointer = position;
    }

    /// True once the pointer has run off the end of the script.
    pub fn is_at_end(&self) -> bool {
        self.instruction_pointer >= self.script.len()
    }

    /// Decodes the instruction at the current pointer.
    pub fn current_instruction(&self) -> VmResult<Instruction> {
        Instruction::decode(&self.script, self.instruction_pointer)
    }

    /// Clones this frame with its pointer moved to `position`.
    pub fn clone_with_position(&self, position: usize) -> Self {
        Self {
            script: Arc::clone(&self.script),
            instruction_pointer: position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_script() {
        let context = ExecutionContext::new(vec![0x61, 0x61]);
        let clone = context.clone_with_position(1);
        assert_eq!(clone.instruction_pointer(), 1);
        assert_eq!(clone.script(), context.script());
        assert!(!clone.is_at_end());
        assert!(clone.clone_with_position(2).is_at_end());
    }
}
