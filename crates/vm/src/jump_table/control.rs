//! Flow control and exception operations.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;

/// Registers the control operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::NOP, nop);
    jump_table.register(OpCode::JMP, jmp);
    jump_table.register(OpCode::JMPIF, jmpif);
    jump_table.register(OpCode::JMPIFNOT, jmpifnot);
    jump_table.register(OpCode::CALL, call);
    jump_table.register(OpCode::RET, ret);
    jump_table.register(OpCode::THROW, throw);
    jump_table.register(OpCode::THROWIFNOT, throw_if_not);
}

/// Resolves a branch target.
///
/// The offset is relative to the branch opcode itself and the target may
/// equal the script length, which returns on the next step.
fn branch_target(engine: &ExecutionEngine, instruction: &Instruction) -> VmResult<isize> {
    let offset = instruction.token_i16()?;
    let target = instruction.pointer as isize + offset as isize;
    let length = engine
        .current_context()
        .ok_or(VmError::NoContext)?
        .script()
        .len();
    if target < 0 || target as usize > length {
        return Err(VmError::InvalidJump { target, length });
    }
    Ok(target)
}

/// Implements the NOP operation.
fn nop(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    Ok(())
}

/// Implements the JMP operation.
fn jmp(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let target = branch_target(engine, instruction)?;
    engine.jump_to(target)
}

/// Implements the JMPIF operation.
fn jmpif(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let target = branch_target(engine, instruction)?;
    if engine.evaluation_stack_mut().pop_bool()? {
        engine.jump_to(target)?;
    }
    Ok(())
}

/// Implements the JMPIFNOT operation.
fn jmpifnot(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let target = branch_target(engine, instruction)?;
    if !engine.evaluation_stack_mut().pop_bool()? {
        engine.jump_to(target)?;
    }
    Ok(())
}

/// Implements the CALL operation.
///
/// The current frame becomes the caller and resumes after the operand; a
/// clone of it, positioned at the target, becomes the new current frame.
fn call(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let target = branch_target(engine, instruction)?;
    let caller = engine.current_context_mut()?;
    caller.set_instruction_pointer(instruction.next_pointer());
    let callee = caller.clone_with_position(target as usize);
    engine.load_context(callee)?;
    engine.is_jumping = true;
    Ok(())
}

/// Implements the RET operation.
fn ret(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.return_from_context()?;
    engine.is_jumping = true;
    Ok(())
}

/// Implements the THROW operation.
fn throw(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    Err(VmError::Throw)
}

/// Implements the THROWIFNOT operation.
fn throw_if_not(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    if engine.evaluation_stack_mut().pop_bool()? {
        Ok(())
    } else {
        Err(VmError::Throw)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ExecutionEngine, OpCode, StackItem, VMState, VmError};

    fn run(script: Vec<u8>) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        engine.load_script(script).unwrap();
        engine.execute();
        engine
    }

    fn op(opcode: OpCode) -> u8 {
        opcode as u8
    }

    #[test]
    fn test_jmp_skips_forward() {
        // JMP +4 lands on PUSH2, skipping PUSH1.
        let engine = run(vec![op(OpCode::JMP), 0x04, 0x00, op(OpCode::PUSH1), op(OpCode::PUSH2)]);
        assert_eq!(engine.state(), VMState::HALT);
        assert_eq!(engine.evaluation_stack().to_vec(), vec![StackItem::from_int(2)]);
    }

    #[test]
    fn test_jump_to_script_end_halts() {
        let engine = run(vec![op(OpCode::JMP), 0x03, 0x00]);
        assert_eq!(engine.state(), VMState::HALT);
    }

    #[test]
    fn test_jump_out_of_range_faults() {
        let engine = run(vec![op(OpCode::JMP), 0x04, 0x00]);
        assert_eq!(engine.state(), VMState::FAULT);
        let engine = run(vec![op(OpCode::NOP), op(OpCode::JMP), 0xFE, 0xFF]);
        assert_eq!(engine.state(), VMState::FAULT);
    }

    #[test]
    fn test_conditional_jumps() {
        // PUSH0 JMPIF +4 PUSH1 PUSH2 : condition false, both pushes run.
        let engine = run(vec![
            op(OpCode::PUSH0),
            op(OpCode::JMPIF),
            0x04,
            0x00,
            op(OpCode::PUSH1),
            op(OpCode::PUSH2),
        ]);
        assert_eq!(engine.evaluation_stack().len(), 2);

        let engine = run(vec![
            op(OpCode::PUSH0),
            op(OpCode::JMPIFNOT),
            0x04,
            0x00,
            op(OpCode::PUSH1),
            op(OpCode::PUSH2),
        ]);
        assert_eq!(engine.evaluation_stack().to_vec(), vec![StackItem::from_int(2)]);
    }

    #[test]
    fn test_call_and_ret() {
        // 0: CALL +5 -> 5
        // 3: PUSH3
        // 4: RET
        // 5: PUSH5
        // 6: RET  (returns to 3)
        let engine = run(vec![
            op(OpCode::CALL),
            0x05,
            0x00,
            op(OpCode::PUSH3),
            op(OpCode::RET),
            op(OpCode::PUSH5),
            op(OpCode::RET),
        ]);
        assert_eq!(engine.state(), VMState::HALT);
        assert_eq!(
            engine.evaluation_stack().to_vec(),
            vec![StackItem::from_int(5), StackItem::from_int(3)]
        );
    }

    #[test]
    fn test_unbounded_recursion_faults() {
        // CALL to itself never returns.
        let engine = run(vec![op(OpCode::CALL), 0x00, 0x00]);
        assert_eq!(engine.state(), VMState::FAULT);
        assert_eq!(
            engine.fault_message(),
            Some(VmError::InvocationStackOverflow { limit: 1024 }.to_string().as_str())
        );
    }

    #[test]
    fn test_throw() {
        assert_eq!(run(vec![op(OpCode::THROW)]).state(), VMState::FAULT);
        assert_eq!(
            run(vec![op(OpCode::PUSH1), op(OpCode::THROWIFNOT)]).state(),
            VMState::HALT
        );
        assert_eq!(
            run(vec![op(OpCode::PUSH0), op(OpCode::THROWIFNOT)]).state(),
            VMState::FAULT
        );
    }
}
