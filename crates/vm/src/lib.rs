//! # Onyx Virtual Machine
//!
//! A deterministic stack machine that runs the script carried by an
//! invocation transaction.
//!
//! ## Architecture
//!
//! - **ExecutionEngine**: main loop, invocation stack and fault recording
//! - **EvaluationStack**: bounded stack shared by every frame of one run
//! - **ExecutionContext**: a script plus its instruction pointer
//! - **JumpTable**: opcode dispatch, one module per opcode family
//! - **StackItem**: the values scripts operate on
//! - **ScriptBuilder**: programmatic script construction
//!
//! A fault never escapes as a Rust error: [`ExecutionEngine::execute`]
//! always returns the final [`VMState`].
//!
//! ## Example
//!
//! ```rust
//! use onyx_vm::{ExecutionEngine, OpCode, ScriptBuilder, StackItem, VMState};
//!
//! let mut builder = ScriptBuilder::new();
//! builder
//!     .emit_push_int(2)
//!     .emit_push_int(3)
//!     .emit_opcode(OpCode::ADD)
//!     .emit_push_int(5)
//!     .emit_opcode(OpCode::NUMEQUAL);
//!
//! let mut engine = ExecutionEngine::new();
//! engine.load_script(builder.to_array()).unwrap();
//! assert_eq!(engine.execute(), VMState::HALT);
//! assert_eq!(engine.result(), Some(&StackItem::Boolean(true)));
//! ```

pub mod big_integer;
pub mod error;
pub mod evaluation_stack;
pub mod execution_context;
pub mod execution_engine;
pub mod instruction;
pub mod jump_table;
pub mod op_code;
pub mod script_builder;
pub mod stack_item;
pub mod vm_state;

pub use error::{VmError, VmResult};
pub use evaluation_stack::EvaluationStack;
pub use execution_context::ExecutionContext;
pub use execution_engine::{ExecutionEngine, ExecutionEngineLimits};
pub use instruction::Instruction;
pub use jump_table::{InstructionHandler, JumpTable};
pub use op_code::{OpCode, OperandSize};
pub use script_builder::ScriptBuilder;
pub use stack_item::{InteropInterface, StackItem, StackItemType, MAX_CLONE_LENGTH};
pub use vm_state::VMState;
