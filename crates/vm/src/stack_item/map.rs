//! Map stack item.

use crate::stack_item::StackItem;
use parking_lot::RwLock;
use std::sync::Arc;

/// An insertion-ordered map with reference semantics.
///
/// Keys are compared with [`StackItem::equals`], and iteration follows
/// insertion order so results never depend on hashing.
#[derive(Debug, Clone, Default)]
pub struct Map(Arc<RwLock<Vec<(StackItem, StackItem)>>>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Inserts or replaces the value stored under `key`.
    pub fn insert(&self, key: StackItem, value: StackItem) {
        let mut entries = self.0.write();
        match entries.iter_mut().find(|(k, _)| k.equals(&key)) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &StackItem) -> Option<StackItem> {
        self.0
            .read()
            .iter()
            .find(|(k, _)| k.equals(key))
            .map(|(_, v)| v.clone())
    }

    pub fn ptr_eq(&self, other: &Map) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
