//! Byte string operations.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_traits::ToPrimitive;

/// Registers the splice operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::CAT, cat);
    jump_table.register(OpCode::SUBSTR, substr);
    jump_table.register(OpCode::LEFT, left);
    jump_table.register(OpCode::RIGHT, right);
    jump_table.register(OpCode::SIZE, size);
}

/// Pops a length or offset operand, rejecting negative values.
fn pop_length(engine: &mut ExecutionEngine, what: &str) -> VmResult<usize> {
    let value = engine.evaluation_stack_mut().pop_int()?;
    value
        .to_usize()
        .ok_or_else(|| VmError::out_of_range(format!("{what} {value}")))
}

/// Implements the CAT operation.
fn cat(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let second = engine.evaluation_stack_mut().pop_bytes()?;
    let mut first = engine.evaluation_stack_mut().pop_bytes()?;
    engine.check_item_size(first.len() + second.len())?;
    first.extend_from_slice(&second);
    engine.push(StackItem::from_bytes(first))
}

/// Implements the SUBSTR operation.
fn substr(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_length(engine, "count")?;
    let start = pop_length(engine, "start")?;
    let bytes = engine.evaluation_stack_mut().pop_bytes()?;
    let end = start
        .checked_add(count)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            VmError::out_of_range(format!(
                "substring {start}+{count} of {} bytes",
                bytes.len()
            ))
        })?;
    engine.push(StackItem::from_bytes(bytes[start..end].to_vec()))
}

/// Implements the LEFT operation.
fn left(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_length(engine, "count")?;
    let mut bytes = engine.evaluation_stack_mut().pop_bytes()?;
    if count > bytes.len() {
        return Err(VmError::out_of_range(format!(
            "left {count} of {} bytes",
            bytes.len()
        )));
    }
    bytes.truncate(count);
    engine.push(StackItem::from_bytes(bytes))
}

/// Implements the RIGHT operation.
fn right(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_length(engine, "count")?;
    let bytes = engine.evaluation_stack_mut().pop_bytes()?;
    if count > bytes.len() {
        return Err(VmError::out_of_range(format!(
            "right {count} of {} bytes",
            bytes.len()
        )));
    }
    engine.push(StackItem::from_bytes(bytes[bytes.len() - count..].to_vec()))
}

/// Implements the SIZE operation.
fn size(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let bytes = engine.evaluation_stack_mut().pop_bytes()?;
    engine.push(StackItem::from_int(bytes.len() as i64))
}

#[cfg(test)]
mod tests {
    use crate::{ExecutionEngine, ExecutionEngineLimits, JumpTable, OpCode, StackItem, VMState};

    fn run_with(items: Vec<StackItem>, ops: &[OpCode]) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        for item in items {
            engine.evaluation_stack_mut().push(item).unwrap();
        }
        engine
            .load_script(ops.iter().map(|op| *op as u8).collect())
            .unwrap();
        engine.execute();
        engine
    }

    fn bytes(data: &[u8]) -> StackItem {
        StackItem::from_bytes(data.to_vec())
    }

    #[test]
    fn test_cat() {
        let engine = run_with(vec![bytes(b"ab"), bytes(b"cd")], &[OpCode::CAT]);
        assert_eq!(engine.result(), Some(&bytes(b"abcd")));
    }

    #[test]
    fn test_cat_respects_item_size() {
        let limits = ExecutionEngineLimits {
            max_item_size: 3,
            ..ExecutionEngineLimits::DEFAULT
        };
        let mut engine = ExecutionEngine::with_limits(JumpTable::default(), limits);
        engine.evaluation_stack_mut().push(bytes(b"ab")).unwrap();
        engine.evaluation_stack_mut().push(bytes(b"cd")).unwrap();
        engine.load_script(vec![OpCode::CAT as u8]).unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
    }

    #[test]
    fn test_substr() {
        let engine = run_with(
            vec![bytes(&[1, 2, 3, 4]), StackItem::from_int(1), StackItem::from_int(2)],
            &[OpCode::SUBSTR],
        );
        assert_eq!(engine.result(), Some(&bytes(&[2, 3])));

        let engine = run_with(
            vec![bytes(&[1, 2, 3, 4]), StackItem::from_int(4), StackItem::from_int(0)],
            &[OpCode::SUBSTR],
        );
        assert_eq!(engine.result(), Some(&bytes(&[])));
    }

    #[test]
    fn test_substr_out_of_bounds_faults() {
        let engine = run_with(
            vec![bytes(&[1, 2, 3, 4]), StackItem::from_int(5), StackItem::from_int(3)],
            &[OpCode::SUBSTR],
        );
        assert_eq!(engine.state(), VMState::FAULT);

        let engine = run_with(
            vec![bytes(&[1, 2, 3, 4]), StackItem::from_int(-1), StackItem::from_int(1)],
            &[OpCode::SUBSTR],
        );
        assert_eq!(engine.state(), VMState::FAULT);
    }

    #[test]
    fn test_left_and_right() {
        let engine = run_with(vec![bytes(&[1, 2, 3]), StackItem::from_int(0)], &[OpCode::LEFT]);
        assert_eq!(engine.state(), VMState::HALT);
        assert_eq!(engine.result(), Some(&bytes(&[])));

        let engine = run_with(vec![bytes(&[1, 2, 3]), StackItem::from_int(2)], &[OpCode::RIGHT]);
        assert_eq!(engine.result(), Some(&bytes(&[2, 3])));

        let engine = run_with(vec![bytes(&[1, 2, 3]), StackItem::from_int(4)], &[OpCode::LEFT]);
        assert_eq!(engine.state(), VMState::FAULT);

        let engine = run_with(vec![bytes(&[1, 2, 3]), StackItem::from_int(-1)], &[OpCode::RIGHT]);
        assert_eq!(engine.state(), VMState::FAULT);
    }

    #[test]
    fn test_size() {
        let engine = run_with(vec![bytes(&[9; 5])], &[OpCode::SIZE]);
        assert_eq!(engine.result(), Some(&StackItem::from_int(5)));
        let engine = run_with(vec![StackItem::from_int(0)], &[OpCode::SIZE]);
        assert_eq!(engine.result(), Some(&StackItem::from_int(0)));
    }
}
