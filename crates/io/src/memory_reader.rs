//! Cursor over a borrowed byte slice.

use crate::error::{IoError, IoResult};

/// Reads wire-format values from a byte slice, tracking the position.
pub struct MemoryReader<'a> {
    memory: &'a [u8],
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(memory: &'a [u8]) -> Self {
        Self { memory, pos: 0 }
    }

    /// Creates a reader starting at `position`.
    pub fn with_position(memory: &'a [u8], position: usize) -> IoResult<Self> {
        if position > memory.len() {
            return Err(IoError::end_of_stream(position, "seek target"));
        }
        Ok(Self {
            memory,
            pos: position,
        })
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.memory.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    fn ensure(&self, count: usize, entity: &'static str) -> IoResult<()> {
        if count > self.remaining() {
            Err(IoError::end_of_stream(self.pos, entity))
        } else {
            Ok(())
        }
    }

    fn take<const N: usize>(&mut self, entity: &'static str) -> IoResult<[u8; N]> {
        self.ensure(N, entity)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.memory[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Returns the next byte without consuming it.
    pub fn peek(&self) -> IoResult<u8> {
        self.ensure(1, "u8")?;
        Ok(self.memory[self.pos])
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        Ok(self.take::<1>("u8")?[0])
    }

    pub fn read_bool(&mut self) -> IoResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(IoError::invalid_data(format!(
                "invalid boolean value {other:#04x}"
            ))),
        }
    }

    pub fn read_u16(&mut self) -> IoResult<u16> {
        self.take::<2>("u16").map(u16::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> IoResult<i16> {
        self.take::<2>("i16").map(i16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> IoResult<u32> {
        self.take::<4>("u32").map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> IoResult<u64> {
        self.take::<8>("u64").map(u64::from_le_bytes)
    }

    /// Reads exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> IoResult<&'a [u8]> {
        self.ensure(count, "bytes")?;
        let out = &self.memory[self.pos..self.pos + count];
        self.pos += count;
        Ok(out)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> IoResult<[u8; N]> {
        self.take::<N>("fixed array")
    }

    /// Reads a variable-length integer no larger than `max`.
    pub fn read_var_int(&mut self, max: u64) -> IoResult<u64> {
        let prefix = self.read_u8()?;
        let value = match prefix {
            0xFD => u64::from(self.read_u16()?),
            0xFE => u64::from(self.read_u32()?),
            0xFF => self.read_u64()?,
            b => u64::from(b),
        };
        if value > max {
            return Err(IoError::ExceedsMaximum { value, max });
        }
        Ok(value)
    }

    /// Reads a var-int prefixed byte string of at most `max` bytes.
    pub fn read_var_bytes(&mut self, max: usize) -> IoResult<Vec<u8>> {
        let len = self.read_var_int(max as u64)? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }
}
