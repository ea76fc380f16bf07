//! Data output abstractions and implementations
//!
//! Writers for the persisted trie frame: in-memory vectors and arbitrary
//! `std::io::Write` sinks. All multi-byte integers are little-endian.

use std::io::Write;

use crate::error::Result;

/// Trait for writing structured data to various destinations
pub trait DataOutput {
    /// Write a single byte
    fn write_u8(&mut self, value: u8) -> Result<()>;

    /// Write a 32-bit unsigned integer in little-endian format
    fn write_u32(&mut self, value: u32) -> Result<()>;

    /// Write a 64-bit unsigned integer in little-endian format
    fn write_u64(&mut self, value: u64) -> Result<()>;

    /// Write bytes from the provided buffer
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any buffered data to the underlying destination
    fn flush(&mut self) -> Result<()>;
}

/// DataOutput into a `Vec<u8>`
pub struct VecDataOutput {
    data: Vec<u8>,
}

impl VecDataOutput {
    /// Create a new empty output
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create an output with the given initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    /// Number of bytes written
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when nothing has been written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the written bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Convert into the underlying vector
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Default for VecDataOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for VecDataOutput {
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.data.push(value);
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.data.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.data.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// DataOutput into any `std::io::Write` sink
pub struct WriterDataOutput<W> {
    writer: W,
    bytes_written: u64,
}

impl<W: Write> WriterDataOutput<W> {
    /// Create a new output over `writer`
    pub fn new(writer: W) -> Self {
        Self { writer, bytes_written: 0 }
    }

    /// Total bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Convert back to the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DataOutput for WriterDataOutput<W> {
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Convenience: write into a fresh vector
pub fn to_vec() -> VecDataOutput {
    VecDataOutput::new()
}

/// Convenience: wrap a writer
pub fn to_writer<W: Write>(writer: W) -> WriterDataOutput<W> {
    WriterDataOutput::new(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_output_primitives() {
        let mut out = VecDataOutput::new();
        out.write_u8(0x7F).unwrap();
        out.write_u32(0xDEAD_BEEF).unwrap();
        out.write_u64(0x0123_4567_89AB_CDEF).unwrap();
        out.write_bytes(b"tail").unwrap();
        let data = out.into_vec();
        assert_eq!(data.len(), 1 + 4 + 8 + 4);
        assert_eq!(data[0], 0x7F);
        assert_eq!(&data[1..5], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&data[13..], b"tail");
    }

    #[test]
    fn test_writer_output_tracks_bytes() {
        let mut sink = Vec::new();
        let mut out = WriterDataOutput::new(&mut sink);
        out.write_u64(42).unwrap();
        out.write_u8(1).unwrap();
        out.flush().unwrap();
        assert_eq!(out.bytes_written(), 9);
        drop(out);
        assert_eq!(sink.len(), 9);
    }

    #[test]
    fn test_roundtrip_with_input() {
        use crate::io::{DataInput, SliceDataInput};
        let mut out = VecDataOutput::new();
        out.write_u64(u64::MAX).unwrap();
        out.write_u32(7).unwrap();
        let bytes = out.into_vec();
        let mut input = SliceDataInput::new(&bytes);
        assert_eq!(input.read_u64().unwrap(), u64::MAX);
        assert_eq!(input.read_u32().unwrap(), 7);
    }
}
