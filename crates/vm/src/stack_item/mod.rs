//! Stack item types.

pub mod array;
pub mod map;
pub mod stack_item; // allow module inception for clarity of type name
pub mod struct_item;

pub use array::Array;
pub use map::Map;
pub use stack_item::{InteropInterface, StackItem, StackItemType};
pub use struct_item::{Struct, MAX_CLONE_LENGTH};
