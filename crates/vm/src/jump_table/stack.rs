//! Stack manipulation operations.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_traits::ToPrimitive;

/// Registers the stack operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::DUPFROMALTSTACK, dup_from_alt_stack);
    jump_table.register(OpCode::TOALTSTACK, to_alt_stack);
    jump_table.register(OpCode::FROMALTSTACK, from_alt_stack);
    jump_table.register(OpCode::XDROP, xdrop);
    jump_table.register(OpCode::XSWAP, xswap);
    jump_table.register(OpCode::XTUCK, xtuck);
    jump_table.register(OpCode::DEPTH, depth);
    jump_table.register(OpCode::DROP, drop);
    jump_table.register(OpCode::DUP, dup);
    jump_table.register(OpCode::NIP, nip);
    jump_table.register(OpCode::OVER, over);
    jump_table.register(OpCode::PICK, pick);
    jump_table.register(OpCode::ROLL, roll);
    jump_table.register(OpCode::ROT, rot);
    jump_table.register(OpCode::SWAP, swap);
    jump_table.register(OpCode::TUCK, tuck);
}

/// Pops a stack depth operand, rejecting negative values.
fn pop_depth(engine: &mut ExecutionEngine) -> VmResult<usize> {
    let n = engine.evaluation_stack_mut().pop_int()?;
    n.to_usize()
        .ok_or_else(|| VmError::out_of_range(format!("stack index {n}")))
}

/// Implements the DUPFROMALTSTACK operation.
fn dup_from_alt_stack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.alt_stack().peek(0)?.duplicate()?;
    engine.push(item)
}

/// Implements the TOALTSTACK operation.
fn to_alt_stack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.pop()?;
    engine.alt_stack_mut().push(item)
}

/// Implements the FROMALTSTACK operation.
fn from_alt_stack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.alt_stack_mut().pop()?;
    engine.push(item)
}

/// Implements the XDROP operation.
fn xdrop(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_depth(engine)?;
    engine.evaluation_stack_mut().remove(n)?;
    Ok(())
}

/// Implements the XSWAP operation.
fn xswap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_depth(engine)?;
    engine.evaluation_stack_mut().swap(0, n)
}

/// Implements the XTUCK operation.
fn xtuck(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_depth(engine)?;
    let item = engine.evaluation_stack().peek(0)?.duplicate()?;
    engine.evaluation_stack_mut().insert(n, item)
}

/// Implements the DEPTH operation.
fn depth(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let depth = engine.evaluation_stack().len();
    engine.push(StackItem::from_int(depth as i64))
}

/// Implements the DROP operation.
fn drop(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.pop()?;
    Ok(())
}

/// Implements the DUP operation.
fn dup(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.evaluation_stack().peek(0)?.duplicate()?;
    engine.push(item)
}

/// Implements the NIP operation.
fn nip(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.evaluation_stack_mut().remove(1)?;
    Ok(())
}

/// Implements the OVER operation.
fn over(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.evaluation_stack().peek(1)?.duplicate()?;
    engine.push(item)
}

/// Implements the PICK operation.
fn pick(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_depth(engine)?;
    let item = engine.evaluation_stack().peek(n)?.duplicate()?;
    engine.push(item)
}

/// Implements the ROLL operation.
fn roll(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_depth(engine)?;
    roll_from(engine, n)
}

/// Implements the ROT operation: `ROLL` with `n = 3`, so it needs four items.
fn rot(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    roll_from(engine, 3)
}

/// Moves the item `n` positions below the top to the top.
fn roll_from(engine: &mut ExecutionEngine, n: usize) -> VmResult<()> {
    if n == 0 {
        return Ok(());
    }
    let item = engine.evaluation_stack_mut().remove(n)?;
    engine.push(item)
}

/// Implements the SWAP operation.
fn swap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.evaluation_stack_mut().swap(0, 1)
}

/// Implements the TUCK operation.
fn tuck(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.evaluation_stack().peek(0)?.duplicate()?;
    engine.evaluation_stack_mut().insert(2, item)
}

#[cfg(test)]
mod tests {
    use crate::{ExecutionEngine, OpCode, StackItem, VMState};
    use num_bigint::BigInt;

    fn run(ops: &[OpCode]) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        engine
            .load_script(ops.iter().map(|op| *op as u8).collect())
            .unwrap();
        engine.execute();
        engine
    }

    /// The stack as integers, bottom first.
    fn ints(engine: &ExecutionEngine) -> Vec<i64> {
        engine
            .evaluation_stack()
            .iter()
            .map(|item| i64::try_from(item.as_int().unwrap()).unwrap())
            .collect()
    }

    use crate::OpCode::*;

    #[test]
    fn test_basic_shuffles() {
        assert_eq!(ints(&run(&[PUSH1, PUSH2, SWAP])), vec![2, 1]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, OVER])), vec![1, 2, 1]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, NIP])), vec![2]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, TUCK])), vec![2, 1, 2]);
        assert_eq!(ints(&run(&[PUSH1, DUP])), vec![1, 1]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, DROP])), vec![1]);
        assert_eq!(ints(&run(&[PUSH7, PUSH8, DEPTH])), vec![7, 8, 2]);
    }

    #[test]
    fn test_rot_matches_roll_three() {
        let rolled = run(&[PUSH1, PUSH2, PUSH3, PUSH4, PUSH3, ROLL]);
        let rotated = run(&[PUSH1, PUSH2, PUSH3, PUSH4, ROT]);
        assert_eq!(rotated.state(), VMState::HALT);
        assert_eq!(ints(&rotated), vec![2, 3, 4, 1]);
        assert_eq!(ints(&rotated), ints(&rolled));

        assert_eq!(run(&[PUSH1, PUSH2, PUSH3, ROT]).state(), VMState::FAULT);
    }

    #[test]
    fn test_indexed_operations() {
        assert_eq!(ints(&run(&[PUSH1, PUSH2, PUSH3, PUSH2, PICK])), vec![1, 2, 3, 1]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, PUSH3, PUSH2, ROLL])), vec![2, 3, 1]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, PUSH0, ROLL])), vec![1, 2]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, PUSH3, PUSH2, XSWAP])), vec![3, 2, 1]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, PUSH3, PUSH1, XDROP])), vec![1, 3]);
        assert_eq!(ints(&run(&[PUSH1, PUSH2, PUSH3, PUSH2, XTUCK])), vec![1, 3, 2, 3]);
    }

    #[test]
    fn test_negative_index_faults() {
        for op in [PICK, ROLL, XDROP, XSWAP, XTUCK] {
            assert_eq!(run(&[PUSH1, PUSH2, PUSHM1, op]).state(), VMState::FAULT);
        }
    }

    #[test]
    fn test_index_beyond_depth_faults() {
        assert_eq!(run(&[PUSH1, PUSH5, PICK]).state(), VMState::FAULT);
        assert_eq!(run(&[PUSH1, PUSH3, XTUCK]).state(), VMState::FAULT);
        assert_eq!(run(&[DROP]).state(), VMState::FAULT);
    }

    #[test]
    fn test_alt_stack() {
        let engine = run(&[PUSH1, PUSH2, TOALTSTACK, DUPFROMALTSTACK, FROMALTSTACK]);
        assert_eq!(engine.state(), VMState::HALT);
        assert_eq!(ints(&engine), vec![1, 2, 2]);
        assert!(engine.alt_stack().is_empty());
        assert_eq!(run(&[FROMALTSTACK]).state(), VMState::FAULT);
    }

    #[test]
    fn test_dup_struct_is_independent() {
        let mut engine = ExecutionEngine::new();
        engine
            .evaluation_stack_mut()
            .push(StackItem::from_struct(vec![StackItem::from_int(1)]))
            .unwrap();
        engine.load_script(vec![DUP as u8]).unwrap();
        engine.execute();
        assert_eq!(engine.state(), VMState::HALT);

        let stack = engine.evaluation_stack().to_vec();
        if let (StackItem::Struct(a), StackItem::Struct(mut b)) = (stack[0].clone(), stack[1].clone()) {
            b.items_mut().push(StackItem::Integer(BigInt::from(2)));
            assert_eq!(a.len(), 1);
        } else {
            panic!("expected structs");
        }
    }
}
