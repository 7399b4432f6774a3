//! Array stack item.

use crate::stack_item::StackItem;
use parking_lot::RwLock;
use std::sync::Arc;

/// An ordered, mutable list with reference semantics.
///
/// Duplicating an array on the stack copies the handle, so every copy
/// observes the same elements.
#[derive(Debug, Clone, Default)]
pub struct Array(Arc<RwLock<Vec<StackItem>>>);

impl Array {
    pub fn new(items: Vec<StackItem>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<StackItem> {
        self.0.read().get(index).cloned()
    }

    pub fn push(&self, item: StackItem) {
        self.0.write().push(item);
    }

    /// Copies the current elements out.
    pub fn items(&self) -> Vec<StackItem> {
        self.0.read().clone()
    }

    /// True when both handles refer to the same array.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Element-wise comparison with `compare`, short-circuiting on identity.
    pub(crate) fn elements_eq(
        &self,
        other: &Array,
        compare: impl Fn(&StackItem, &StackItem) -> bool,
    ) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let left = self.items();
        let right = other.items();
        left.len() == right.len() && left.iter().zip(right.iter()).all(|(a, b)| compare(a, b))
    }
}
