//! Execution engine.
//!
//! One engine runs one script to completion. The evaluation and alt stacks
//! belong to the engine and are shared by every frame, so `CALL` and `RET`
//! move only the instruction pointer.

use crate::error::{VmError, VmResult};
use crate::evaluation_stack::EvaluationStack;
use crate::execution_context::ExecutionContext;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::stack_item::StackItem;
use crate::vm_state::VMState;
use tracing::debug;

/// Restrictions on the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionEngineLimits {
    /// The maximum number of items on the evaluation stack and on the alt stack.
    pub max_stack_size: usize,

    /// The maximum size of a byte string produced by a script.
    pub max_item_size: usize,

    /// The maximum number of frames allowed on the invocation stack.
    pub max_invocation_stack_size: usize,
}

impl ExecutionEngineLimits {
    /// The default execution engine limits.
    pub const DEFAULT: Self = Self {
        max_stack_size: 2048,
        max_item_size: 1024 * 1024,
        max_invocation_stack_size: 1024,
    };
}

impl Default for ExecutionEngineLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The execution engine for the VM.
pub struct ExecutionEngine {
    state: VMState,

    /// Set by handlers that move the pointer themselves.
    pub(crate) is_jumping: bool,

    jump_table: JumpTable,
    limits: ExecutionEngineLimits,

    /// Frames; the last one is current.
    invocation_stack: Vec<ExecutionContext>,

    evaluation_stack: EvaluationStack,
    alt_stack: EvaluationStack,

    fault_message: Option<String>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngine {
    /// Creates an engine with the default jump table and limits.
    pub fn new() -> Self {
        Self::with_limits(JumpTable::default(), ExecutionEngineLimits::default())
    }

    pub fn with_limits(jump_table: JumpTable, limits: ExecutionEngineLimits) -> Self {
        Self {
            state: VMState::BREAK,
            is_jumping: false,
            jump_table,
            limits,
            invocation_stack: Vec::new(),
            evaluation_stack: EvaluationStack::new(limits.max_stack_size),
            alt_stack: EvaluationStack::new(limits.max_stack_size),
            fault_message: None,
        }
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: VMState) {
        self.state = state;
    }

    pub fn limits(&self) -> &ExecutionEngineLimits {
        &self.limits
    }

    /// Why the run faulted, if it did.
    pub fn fault_message(&self) -> Option<&str> {
        self.fault_message.as_deref()
    }

    pub fn evaluation_stack(&self) -> &EvaluationStack {
        &self.evaluation_stack
    }

    /// Mutable access, used by hosts to push arguments before running.
    pub fn evaluation_stack_mut(&mut self) -> &mut EvaluationStack {
        &mut self.evaluation_stack
    }

    pub fn alt_stack(&self) -> &EvaluationStack {
        &self.alt_stack
    }

    pub(crate) fn alt_stack_mut(&mut self) -> &mut EvaluationStack {
        &mut self.alt_stack
    }

    /// The top of the evaluation stack.
    pub fn result(&self) -> Option<&StackItem> {
        self.evaluation_stack.peek(0).ok()
    }

    pub fn invocation_stack(&self) -> &[ExecutionContext] {
        &self.invocation_stack
    }

    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.last()
    }

    pub(crate) fn current_context_mut(&mut self) -> VmResult<&mut ExecutionContext> {
        self.invocation_stack.last_mut().ok_or(VmError::NoContext)
    }

    /// Loads a script as the entry frame.
    pub fn load_script(&mut self, script: Vec<u8>) -> VmResult<()> {
        self.load_context(ExecutionContext::new(script))
    }

    /// Pushes a frame onto the invocation stack.
    pub fn load_context(&mut self, context: ExecutionContext) -> VmResult<()> {
        if self.invocation_stack.len() >= self.limits.max_invocation_stack_size {
            return Err(VmError::InvocationStackOverflow {
                limit: self.limits.max_invocation_stack_size,
            });
        }
        self.invocation_stack.push(context);
        Ok(())
    }

    /// Pops the current frame; emptying the invocation stack halts the run.
    pub(crate) fn return_from_context(&mut self) -> VmResult<()> {
        self.invocation_stack.pop().ok_or(VmError::NoContext)?;
        if self.invocation_stack.is_empty() {
            self.set_state(VMState::HALT);
        }
        Ok(())
    }

    /// Runs until HALT or FAULT and returns the final state.
    pub fn execute(&mut self) -> VMState {
        if self.state == VMState::BREAK {
            self.set_state(VMState::NONE);
        }
        if self.invocation_stack.is_empty() && !self.state.is_terminal() {
            self.set_state(VMState::HALT);
        }

        while !self.state.is_terminal() {
            if let Err(err) = self.execute_next() {
                self.on_fault(err);
            }
        }

        self.state
    }

    /// Runs one instruction and stops in BREAK unless the run ended.
    pub fn step(&mut self) -> VMState {
        if self.state.is_terminal() {
            return self.state;
        }
        if let Err(err) = self.execute_next() {
            self.on_fault(err);
        } else if !self.state.is_terminal() {
            self.set_state(VMState::BREAK);
        }
        self.state
    }

    /// Executes the next instruction.
    fn execute_next(&mut self) -> VmResult<()> {
        let context = self.current_context().ok_or(VmError::NoContext)?;

        if context.is_at_end() {
            // Running off the end of a script returns from it.
            return self.return_from_context();
        }

        let instruction = context.current_instruction()?;
        self.is_jumping = false;
        self.execute_instruction(&instruction)?;

        if !self.is_jumping && !self.state.is_terminal() {
            let context = self.current_context_mut()?;
            context.set_instruction_pointer(instruction.next_pointer());
        }
        Ok(())
    }

    fn execute_instruction(&mut self, instruction: &Instruction) -> VmResult<()> {
        let handler = self
            .jump_table
            .get(instruction.opcode())
            .ok_or(VmError::UnsupportedOpcode(instruction.opcode().name()))?;
        handler(self, instruction)
    }

    /// Called when an error causes the VM to enter the FAULT state.
    fn on_fault(&mut self, err: VmError) {
        let position = self
            .current_context()
            .map(ExecutionContext::instruction_pointer);
        debug!(error = %err, ?position, "vm fault");
        self.fault_message = Some(err.to_string());
        self.set_state(VMState::FAULT);
    }

    /// Moves the current frame's pointer to `target`, relative to the script start.
    pub(crate) fn jump_to(&mut self, target: isize) -> VmResult<()> {
        let context = self.current_context_mut()?;
        let length = context.script().len();
        if target < 0 || target as usize > length {
            return Err(VmError::InvalidJump { target, length });
        }
        context.set_instruction_pointer(target as usize);
        self.is_jumping = true;
        Ok(())
    }

    /// Pushes onto the evaluation stack.
    #[inline]
    pub(crate) fn push(&mut self, item: StackItem) -> VmResult<()> {
        self.evaluation_stack.push(item)
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> VmResult<StackItem> {
        self.evaluation_stack.pop()
    }

    /// Rejects byte strings longer than the item size limit.
    pub(crate) fn check_item_size(&self, size: usize) -> VmResult<()> {
        if size > self.limits.max_item_size {
            return Err(VmError::ItemTooLarge {
                size,
                max: self.limits.max_item_size,
            });
        }
        Ok(())
    }
}
