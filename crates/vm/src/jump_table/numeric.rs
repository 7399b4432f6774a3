//! Arithmetic, comparison and boolean operations.
//!
//! Operands and results are bounded by [`crate::big_integer::MAX_INTEGER_SIZE`].
//! Division truncates toward zero and the remainder takes the sign of the
//! dividend.

use crate::big_integer;
use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

/// Largest shift accepted by SHL and SHR.
const MAX_SHIFT: usize = 256;

/// Registers the numeric operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::INC, inc);
    jump_table.register(OpCode::DEC, dec);
    jump_table.register(OpCode::SIGN, sign);
    jump_table.register(OpCode::NEGATE, negate);
    jump_table.register(OpCode::ABS, abs);
    jump_table.register(OpCode::NOT, not);
    jump_table.register(OpCode::NZ, nz);
    jump_table.register(OpCode::ADD, add);
    jump_table.register(OpCode::SUB, sub);
    jump_table.register(OpCode::MUL, mul);
    jump_table.register(OpCode::DIV, div);
    jump_table.register(OpCode::MOD, modulo);
    jump_table.register(OpCode::SHL, shl);
    jump_table.register(OpCode::SHR, shr);
    jump_table.register(OpCode::BOOLAND, bool_and);
    jump_table.register(OpCode::BOOLOR, bool_or);
    jump_table.register(OpCode::NUMEQUAL, num_equal);
    jump_table.register(OpCode::NUMNOTEQUAL, num_not_equal);
    jump_table.register(OpCode::LT, lt);
    jump_table.register(OpCode::GT, gt);
    jump_table.register(OpCode::LTE, lte);
    jump_table.register(OpCode::GTE, gte);
    jump_table.register(OpCode::MIN, min);
    jump_table.register(OpCode::MAX, max);
    jump_table.register(OpCode::WITHIN, within);
}

fn push_int(engine: &mut ExecutionEngine, value: BigInt) -> VmResult<()> {
    let value = big_integer::check_size(value)?;
    engine.push(StackItem::Integer(value))
}

fn unary(engine: &mut ExecutionEngine, op: impl FnOnce(BigInt) -> BigInt) -> VmResult<()> {
    let x = engine.evaluation_stack_mut().pop_int()?;
    push_int(engine, op(x))
}

/// Pops `x2` then `x1` and pushes `op(x1, x2)`.
fn binary(
    engine: &mut ExecutionEngine,
    op: impl FnOnce(BigInt, BigInt) -> VmResult<BigInt>,
) -> VmResult<()> {
    let x2 = engine.evaluation_stack_mut().pop_int()?;
    let x1 = engine.evaluation_stack_mut().pop_int()?;
    let result = op(x1, x2)?;
    push_int(engine, result)
}

fn compare(
    engine: &mut ExecutionEngine,
    predicate: impl FnOnce(&BigInt, &BigInt) -> bool,
) -> VmResult<()> {
    let x2 = engine.evaluation_stack_mut().pop_int()?;
    let x1 = engine.evaluation_stack_mut().pop_int()?;
    engine.push(StackItem::Boolean(predicate(&x1, &x2)))
}

fn pop_shift(engine: &mut ExecutionEngine) -> VmResult<usize> {
    let shift = engine.evaluation_stack_mut().pop_int()?;
    shift
        .to_usize()
        .filter(|s| *s <= MAX_SHIFT)
        .ok_or_else(|| VmError::out_of_range(format!("shift {shift}")))
}

/// Implements the INC operation.
fn inc(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| x + 1)
}

/// Implements the DEC operation.
fn dec(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| x - 1)
}

/// Implements the SIGN operation.
fn sign(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| x.signum())
}

/// Implements the NEGATE operation.
fn negate(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| -x)
}

/// Implements the ABS operation.
fn abs(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    unary(engine, |x| x.abs())
}

/// Implements the NOT operation.
fn not(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.evaluation_stack_mut().pop_bool()?;
    engine.push(StackItem::Boolean(!x))
}

/// Implements the NZ operation.
fn nz(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.evaluation_stack_mut().pop_int()?;
    engine.push(StackItem::Boolean(!x.is_zero()))
}

/// Implements the ADD operation.
fn add(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| Ok(a + b))
}

/// Implements the SUB operation.
fn sub(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| Ok(a - b))
}

/// Implements the MUL operation.
fn mul(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| Ok(a * b))
}

/// Implements the DIV operation.
fn div(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| {
        if b.is_zero() {
            return Err(VmError::DivisionByZero);
        }
        Ok(a / b)
    })
}

/// Implements the MOD operation.
fn modulo(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| {
        if b.is_zero() {
            return Err(VmError::DivisionByZero);
        }
        Ok(a % b)
    })
}

/// Implements the SHL operation.
fn shl(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let shift = pop_shift(engine)?;
    let x = engine.evaluation_stack_mut().pop_int()?;
    push_int(engine, x << shift)
}

/// Implements the SHR operation.
fn shr(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let shift = pop_shift(engine)?;
    let x = engine.evaluation_stack_mut().pop_int()?;
    push_int(engine, x >> shift)
}

/// Implements the BOOLAND operation.
fn bool_and(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.evaluation_stack_mut().pop_bool()?;
    let x1 = engine.evaluation_stack_mut().pop_bool()?;
    engine.push(StackItem::Boolean(x1 && x2))
}

/// Implements the BOOLOR operation.
fn bool_or(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.evaluation_stack_mut().pop_bool()?;
    let x1 = engine.evaluation_stack_mut().pop_bool()?;
    engine.push(StackItem::Boolean(x1 || x2))
}

/// Implements the NUMEQUAL operation.
fn num_equal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    compare(engine, |a, b| a == b)
}

/// Implements the NUMNOTEQUAL operation.
fn num_not_equal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    compare(engine, |a, b| a != b)
}

/// Implements the LT operation.
fn lt(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    compare(engine, |a, b| a < b)
}

/// Implements the GT operation.
fn gt(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    compare(engine, |a, b| a > b)
}

/// Implements the LTE operation.
fn lte(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    compare(engine, |a, b| a <= b)
}

/// Implements the GTE operation.
fn gte(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    compare(engine, |a, b| a >= b)
}

/// Implements the MIN operation.
fn min(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| Ok(a.min(b)))
}

/// Implements the MAX operation.
fn max(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    binary(engine, |a, b| Ok(a.max(b)))
}

/// Implements the WITHIN operation: pushes `a <= x < b`.
fn within(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let b = engine.evaluation_stack_mut().pop_int()?;
    let a = engine.evaluation_stack_mut().pop_int()?;
    let x = engine.evaluation_stack_mut().pop_int()?;
    engine.push(StackItem::Boolean(a <= x && x < b))
}
