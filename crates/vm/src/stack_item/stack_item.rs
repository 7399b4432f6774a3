//! Stack item implementation.

use crate::big_integer;
use crate::error::{VmError, VmResult};
use crate::stack_item::{Array, Map, Struct};
use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;
use std::sync::Arc;

/// A host object exposed to scripts as an opaque handle.
pub trait InteropInterface: fmt::Debug + Send + Sync {
    /// Gets the type of the interop interface.
    fn interface_type(&self) -> &str;

    /// The value used when two handles are compared.
    fn to_bytes(&self) -> Vec<u8>;
}

/// The type tag of a stack item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StackItemType {
    ByteArray = 0x00,
    Boolean = 0x01,
    Integer = 0x02,
    InteropInterface = 0x40,
    Array = 0x80,
    Struct = 0x81,
    Map = 0x82,
}

/// Represents a value in the VM.
#[derive(Debug, Clone)]
pub enum StackItem {
    Integer(BigInt),
    ByteArray(Vec<u8>),
    Boolean(bool),
    Array(Array),
    Struct(Struct),
    Map(Map),
    InteropInterface(Arc<dyn InteropInterface>),
}

impl StackItem {
    pub fn from_int<T: Into<BigInt>>(value: T) -> Self {
        StackItem::Integer(value.into())
    }

    pub fn from_bytes<T: Into<Vec<u8>>>(value: T) -> Self {
        StackItem::ByteArray(value.into())
    }

    pub fn from_bool(value: bool) -> Self {
        StackItem::Boolean(value)
    }

    pub fn from_array(items: Vec<StackItem>) -> Self {
        StackItem::Array(Array::new(items))
    }

    pub fn from_struct(items: Vec<StackItem>) -> Self {
        StackItem::Struct(Struct::new(items))
    }

    pub fn from_interface<T: InteropInterface + 'static>(value: T) -> Self {
        StackItem::InteropInterface(Arc::new(value))
    }

    /// Returns the type of the stack item.
    pub fn stack_item_type(&self) -> StackItemType {
        match self {
            StackItem::Integer(_) => StackItemType::Integer,
            StackItem::ByteArray(_) => StackItemType::ByteArray,
            StackItem::Boolean(_) => StackItemType::Boolean,
            StackItem::Array(_) => StackItemType::Array,
            StackItem::Struct(_) => StackItemType::Struct,
            StackItem::Map(_) => StackItemType::Map,
            StackItem::InteropInterface(_) => StackItemType::InteropInterface,
        }
    }

    /// Converts the stack item to a boolean.
    ///
    /// Compound items have no truth value.
    pub fn as_bool(&self) -> VmResult<bool> {
        match self {
            StackItem::Boolean(b) => Ok(*b),
            StackItem::Integer(i) => Ok(!i.is_zero()),
            StackItem::ByteArray(b) => Ok(b.iter().any(|&byte| byte != 0)),
            StackItem::InteropInterface(_) => Ok(true),
            StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_) => Err(
                VmError::invalid_type(format!("{:?} has no boolean value", self.stack_item_type())),
            ),
        }
    }

    /// Converts the stack item to an integer.
    pub fn as_int(&self) -> VmResult<BigInt> {
        match self {
            StackItem::Integer(i) => Ok(i.clone()),
            StackItem::Boolean(b) => Ok(BigInt::from(u8::from(*b))),
            StackItem::ByteArray(bytes) => big_integer::from_bytes(bytes),
            _ => Err(VmError::invalid_type(format!(
                "Cannot convert {:?} to Integer",
                self.stack_item_type()
            ))),
        }
    }

    /// Converts the stack item to a byte array.
    pub fn as_bytes(&self) -> VmResult<Vec<u8>> {
        match self {
            StackItem::ByteArray(b) => Ok(b.clone()),
            StackItem::Integer(i) => Ok(big_integer::to_bytes(i)),
            StackItem::Boolean(b) => Ok(vec![u8::from(*b)]),
            _ => Err(VmError::invalid_type(format!(
                "Cannot convert {:?} to ByteArray",
                self.stack_item_type()
            ))),
        }
    }

    /// Copies the item for a stack duplication.
    ///
    /// Structs are deep-cloned within [`crate::MAX_CLONE_LENGTH`]; every other
    /// variant is copied by value or by handle.
    pub fn duplicate(&self) -> VmResult<StackItem> {
        match self {
            StackItem::Struct(s) => Ok(StackItem::Struct(s.clone_bounded()?)),
            other => Ok(other.clone()),
        }
    }

    /// The comparison performed by `EQUAL`.
    ///
    /// Primitives compare by their byte encoding, so `Integer(1)`,
    /// `Boolean(true)` and `ByteArray([1])` are equal. Arrays and structs
    /// compare element-wise, maps by identity and interop handles by value.
    pub fn equals(&self, other: &StackItem) -> bool {
        match (self, other) {
            (StackItem::Array(a), StackItem::Array(b)) => a.elements_eq(b, StackItem::equals),
            (StackItem::Struct(a), StackItem::Struct(b)) => {
                a.len() == b.len()
                    && a.items()
                        .iter()
                        .zip(b.items().iter())
                        .all(|(x, y)| x.equals(y))
            }
            (StackItem::Map(a), StackItem::Map(b)) => a.ptr_eq(b),
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.interface_type() == b.interface_type() && a.to_bytes() == b.to_bytes())
            }
            _ if self.is_primitive() && other.is_primitive() => {
                match (self.as_bytes(), other.as_bytes()) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    #[inline]
    fn is_primitive(&self) -> bool {
        matches!(
            self,
            StackItem::Integer(_) | StackItem::ByteArray(_) | StackItem::Boolean(_)
        )
    }
}

/// Strict equality: same variant and same contents.
impl PartialEq for StackItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StackItem::Integer(a), StackItem::Integer(b)) => a == b,
            (StackItem::ByteArray(a), StackItem::ByteArray(b)) => a == b,
            (StackItem::Boolean(a), StackItem::Boolean(b)) => a == b,
            (StackItem::Array(a), StackItem::Array(b)) => a.elements_eq(b, |x, y| x == y),
            (StackItem::Struct(a), StackItem::Struct(b)) => a == b,
            (StackItem::Map(a), StackItem::Map(b)) => a.ptr_eq(b),
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        StackItem::Boolean(value)
    }
}

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        StackItem::Integer(value)
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        StackItem::ByteArray(value)
    }
}

impl From<i64> for StackItem {
    fn from(value: i64) -> Self {
        StackItem::Integer(BigInt::from(value))
    }
}
