//! Struct stack item.

use crate::error::{VmError, VmResult};
use crate::stack_item::StackItem;

/// Upper bound on the number of elements visited while cloning a struct.
pub const MAX_CLONE_LENGTH: usize = 1024;

/// An ordered list with value semantics.
///
/// Duplicating a struct on the stack produces an independent deep copy of
/// every nested struct; nested arrays stay shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    items: Vec<StackItem>,
}

impl Struct {
    pub fn new(items: Vec<StackItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[StackItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<StackItem> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deep-clones the struct, failing once more than [`MAX_CLONE_LENGTH`]
    /// elements have been visited.
    pub fn clone_bounded(&self) -> VmResult<Self> {
        let mut visited = 0usize;
        self.clone_counting(&mut visited)
    }

    fn clone_counting(&self, visited: &mut usize) -> VmResult<Self> {
        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            *visited += 1;
            if *visited > MAX_CLONE_LENGTH {
                return Err(VmError::out_of_range("struct clone exceeds maximum length"));
            }
            match item {
                StackItem::Struct(inner) => {
                    items.push(StackItem::Struct(inner.clone_counting(visited)?));
                }
                other => items.push(other.clone()),
            }
        }
        Ok(Self { items })
    }
}
