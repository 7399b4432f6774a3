//! Opcode dispatch.
//!
//! Each opcode family lives in its own module and registers its handlers
//! through `register_handlers`.

pub mod bitwise;
pub mod control;
pub mod crypto;
pub mod numeric;
pub mod push;
pub mod splice;
pub mod stack;

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use once_cell::sync::Lazy;

/// A handler for a VM instruction.
pub type InstructionHandler = fn(&mut ExecutionEngine, &Instruction) -> VmResult<()>;

/// Maps every opcode byte to its handler.
#[derive(Clone, Copy)]
pub struct JumpTable {
    handlers: [Option<InstructionHandler>; 256],
}

/// The default table, built once.
static DEFAULT: Lazy<JumpTable> = Lazy::new(JumpTable::new);

impl Default for JumpTable {
    /// Returns a copy of the table with every defined opcode registered.
    fn default() -> Self {
        *DEFAULT
    }
}

impl JumpTable {
    /// Creates a table with all handlers registered.
    pub fn new() -> Self {
        let mut jump_table = Self::empty();
        push::register_handlers(&mut jump_table);
        control::register_handlers(&mut jump_table);
        stack::register_handlers(&mut jump_table);
        splice::register_handlers(&mut jump_table);
        bitwise::register_handlers(&mut jump_table);
        numeric::register_handlers(&mut jump_table);
        crypto::register_handlers(&mut jump_table);
        jump_table
    }

    /// Creates a table with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: [None; 256],
        }
    }

    /// Registers a handler for an opcode.
    pub fn register(&mut self, opcode: OpCode, handler: InstructionHandler) {
        self.handlers[opcode as usize] = Some(handler);
    }

    /// Gets the handler for an opcode.
    pub fn get(&self, opcode: OpCode) -> Option<InstructionHandler> {
        self.handlers[opcode as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StackItem, VMState};

    #[test]
    fn test_every_opcode_has_handler() {
        let jump_table = JumpTable::new();
        for opcode in OpCode::ALL {
            assert!(
                jump_table.get(*opcode).is_some(),
                "No handler for opcode: {opcode}"
            );
        }
    }

    #[test]
    fn test_missing_handler_faults() {
        let mut engine =
            ExecutionEngine::with_limits(JumpTable::empty(), Default::default());
        engine.load_script(vec![OpCode::NOP as u8]).unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
        assert_eq!(engine.fault_message(), Some("Unsupported opcode NOP"));
    }

    #[test]
    fn test_register_overrides() {
        fn custom(engine: &mut ExecutionEngine, _: &Instruction) -> VmResult<()> {
            engine.evaluation_stack_mut().push(StackItem::Boolean(true))
        }

        let mut jump_table = JumpTable::new();
        jump_table.register(OpCode::NOP, custom);
        let mut engine = ExecutionEngine::with_limits(jump_table, Default::default());
        engine.load_script(vec![OpCode::NOP as u8]).unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        assert_eq!(engine.evaluation_stack().len(), 1);
    }
}
