//! # Onyx IO
//!
//! Binary encoding primitives shared by every wire structure of the node:
//! little-endian fixed-width integers, variable-length integers and byte
//! strings, and the [`Serializable`] trait implemented by transactions,
//! blocks and consensus payloads.

pub mod binary_writer;
pub mod error;
pub mod memory_reader;
pub mod serializable;

pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
pub use memory_reader::MemoryReader;
pub use serializable::{helper, Serializable, SerializableExt};
