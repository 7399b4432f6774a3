//! Push operations.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the push operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::PUSH0, push_0);
    for opcode in OpCode::ALL.iter().filter(|op| op.is_push_bytes()) {
        jump_table.register(*opcode, push_bytes);
    }
    jump_table.register(OpCode::PUSHDATA1, push_bytes);
    jump_table.register(OpCode::PUSHDATA2, push_bytes);
    jump_table.register(OpCode::PUSHDATA4, push_bytes);
    jump_table.register(OpCode::PUSHM1, push_small_int);
    for value in 1..=16u8 {
        if let Some(opcode) = OpCode::from_byte(OpCode::PUSH1 as u8 + value - 1) {
            jump_table.register(opcode, push_small_int);
        }
    }
}

/// Implements the PUSH0 operation.
fn push_0(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::from_int(0))
}

/// Implements PUSHBYTES1..75 and PUSHDATA1/2/4.
///
/// The operand was already read and length-checked by the decoder.
fn push_bytes(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    engine.check_item_size(instruction.operand.len())?;
    engine.push(StackItem::from_bytes(instruction.operand.clone()))
}

/// Implements PUSHM1 and PUSH1..PUSH16.
fn push_small_int(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let value = i64::from(instruction.opcode as u8) - i64::from(OpCode::PUSH1 as u8) + 1;
    engine.push(StackItem::from_int(value))
}
