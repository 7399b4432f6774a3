//! Evaluation stack.
//!
//! Indices passed to this type count from the top: `0` is the most recently
//! pushed item.

use crate::error::{VmError, VmResult};
use crate::stack_item::StackItem;
use num_bigint::BigInt;

/// A bounded LIFO stack of [`StackItem`]s.
#[derive(Debug, Clone)]
pub struct EvaluationStack {
    stack: Vec<StackItem>,
    limit: usize,
}

impl EvaluationStack {
    /// Creates a stack that faults once it would hold more than `limit` items.
    pub fn new(limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn underflow(&self, needed: usize) -> VmError {
        VmError::StackUnderflow {
            needed,
            available: self.stack.len(),
        }
    }

    /// Converts a top-relative index into a vector position.
    fn position(&self, index: usize) -> VmResult<usize> {
        if index >= self.stack.len() {
            return Err(self.underflow(index + 1));
        }
        Ok(self.stack.len() - 1 - index)
    }

    /// Pushes an item onto the stack.
    pub fn push(&mut self, item: StackItem) -> VmResult<()> {
        if self.stack.len() >= self.limit {
            return Err(VmError::StackOverflow { limit: self.limit });
        }
        self.stack.push(item);
        Ok(())
    }

    /// Pops an item from the stack.
    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.stack.pop().ok_or_else(|| self.underflow(1))
    }

    pub fn pop_int(&mut self) -> VmResult<BigInt> {
        self.pop()?.as_int()
    }

    pub fn pop_bytes(&mut self) -> VmResult<Vec<u8>> {
        self.pop()?.as_bytes()
    }

    pub fn pop_bool(&mut self) -> VmResult<bool> {
        self.pop()?.as_bool()
    }

    /// Returns the item `index` positions below the top.
    pub fn peek(&self, index: usize) -> VmResult<&StackItem> {
        let position = self.position(index)?;
        Ok(&self.stack[position])
    }

    /// Removes and returns the item `index` positions below the top.
    pub fn remove(&mut self, index: usize) -> VmResult<StackItem> {
        let position = self.position(index)?;
        Ok(self.stack.remove(position))
    }

    /// Inserts `item` so that it ends up `index` positions below the top.
    pub fn insert(&mut self, index: usize, item: StackItem) -> VmResult<()> {
        if index > self.stack.len() {
            return Err(VmError::out_of_range(format!(
                "insert index {index} beyond depth {}",
                self.stack.len()
            )));
        }
        if self.stack.len() >= self.limit {
            return Err(VmError::StackOverflow { limit: self.limit });
        }
        let position = self.stack.len() - index;
        self.stack.insert(position, item);
        Ok(())
    }

    /// Swaps two items, both addressed from the top.
    pub fn swap(&mut self, i: usize, j: usize) -> VmResult<()> {
        let a = self.position(i)?;
        let b = self.position(j)?;
        self.stack.swap(a, b);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Iterates from the bottom of the stack to the top.
    pub fn iter(&self) -> std::slice::Iter<'_, StackItem> {
        self.stack.iter()
    }

    /// Copies the items out, bottom first.
    pub fn to_vec(&self) -> Vec<StackItem> {
        self.stack.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(values: &[i64]) -> EvaluationStack {
        let mut stack = EvaluationStack::new(16);
        for v in values {
            stack.push(StackItem::from_int(*v)).unwrap();
        }
        stack
    }

    fn ints(stack: &EvaluationStack) -> Vec<i64> {
        stack
            .iter()
            .map(|item| i64::try_from(item.as_int().unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_push_pop() {
        let mut stack = stack_of(&[1, 2]);
        assert_eq!(stack.pop_int().unwrap(), BigInt::from(2));
        assert_eq!(stack.len(), 1);
        stack.pop().unwrap();
        assert!(matches!(
            stack.pop(),
            Err(VmError::StackUnderflow { needed: 1, available: 0 })
        ));
    }

    #[test]
    fn test_limit() {
        let mut stack = EvaluationStack::new(2);
        stack.push(StackItem::Boolean(true)).unwrap();
        stack.push(StackItem::Boolean(true)).unwrap();
        assert_eq!(
            stack.push(StackItem::Boolean(true)),
            Err(VmError::StackOverflow { limit: 2 })
        );
        assert!(stack.insert(0, StackItem::from_int(0)).is_err());
    }

    #[test]
    fn test_top_relative_indexing() {
        let mut stack = stack_of(&[1, 2, 3, 4]);
        assert_eq!(stack.peek(0).unwrap(), &StackItem::from_int(4));
        assert_eq!(stack.peek(3).unwrap(), &StackItem::from_int(1));
        assert!(stack.peek(4).is_err());

        assert_eq!(stack.remove(2).unwrap(), StackItem::from_int(2));
        assert_eq!(ints(&stack), vec![1, 3, 4]);

        stack.insert(1, StackItem::from_int(9)).unwrap();
        assert_eq!(ints(&stack), vec![1, 3, 9, 4]);
        stack.insert(4, StackItem::from_int(0)).unwrap();
        assert_eq!(ints(&stack), vec![0, 1, 3, 9, 4]);
        assert!(stack.insert(6, StackItem::from_int(0)).is_err());

        stack.swap(0, 4).unwrap();
        assert_eq!(ints(&stack), vec![4, 1, 3, 9, 0]);
        assert!(stack.swap(0, 5).is_err());
    }
}
