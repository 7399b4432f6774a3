//! Bitwise logic operations.

use crate::big_integer;
use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_bigint::BigInt;

/// Registers the bitwise operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::INVERT, invert);
    jump_table.register(OpCode::AND, and);
    jump_table.register(OpCode::OR, or);
    jump_table.register(OpCode::XOR, xor);
    jump_table.register(OpCode::EQUAL, equal);
}

/// Pops two integers and pushes `op(x1, x2)`, where `x2` was on top.
fn binary(
    engine: &mut ExecutionEngine,
    op: impl FnOnce(BigInt, BigInt) -> BigInt,
) -> VmResult<()> {
    let x2 = engine.evaluation_stack_mut().pop_int()?;
    let x1 = engine.evaluation_stack_mut().pop_int()?;
    let result = big_integer::check_size(op(x1, x2))?;
    engine.push(StackItem::Integer(result))
}

/// Implements the INVERT operation.
fn invert(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let value = engine.evaluation_stack_mut().pop_int()?;
    engine.push(StackItem::Integer(!value))
}

/// Implements the AND operation.
fn and(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| a & b)
}

/// Implements the OR operation.
fn or(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| a | b)
}

/// Implements the XOR operation.
fn xor(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| a ^ b)
}

/// Implements the EQUAL operation.
fn equal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop()?;
    let x1 = engine.pop()?;
    engine.push(StackItem::Boolean(x1.equals(&x2)))
}

#[cfg(test)]
mod tests {
    use crate::{ExecutionEngine, OpCode, StackItem, VMState};

    fn run_with(items: Vec<StackItem>, op: OpCode) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        for item in items {
            engine.evaluation_stack_mut().push(item).unwrap();
        }
        engine.load_script(vec![op as u8]).unwrap();
        engine.execute();
        engine
    }

    fn int(value: i64) -> StackItem {
        StackItem::from_int(value)
    }

    #[test]
    fn test_twos_complement_logic() {
        assert_eq!(run_with(vec![int(5)], OpCode::INVERT).result(), Some(&int(-6)));
        assert_eq!(run_with(vec![int(-1), int(0x0F)], OpCode::AND).result(), Some(&int(0x0F)));
        assert_eq!(run_with(vec![int(-8), int(3)], OpCode::OR).result(), Some(&int(-5)));
        assert_eq!(run_with(vec![int(6), int(3)], OpCode::XOR).result(), Some(&int(5)));
    }

    #[test]
    fn test_equal() {
        let engine = run_with(vec![int(1), StackItem::from_bytes(vec![1])], OpCode::EQUAL);
        assert_eq!(engine.result(), Some(&StackItem::Boolean(true)));

        let engine = run_with(vec![int(256), StackItem::from_bytes(vec![0, 1, 0])], OpCode::EQUAL);
        assert_eq!(engine.result(), Some(&StackItem::Boolean(false)));
    }

    #[test]
    fn test_compound_operand_faults() {
        let engine = run_with(vec![StackItem::from_array(vec![]), int(1)], OpCode::AND);
        assert_eq!(engine.state(), VMState::FAULT);
    }
}
