//! Tail store: collapsed multi-byte labels at the deepest layer
//!
//! When the configured nesting depth is exhausted, remaining multi-byte
//! edge labels are stored flat instead of recursing. Text mode
//! concatenates NUL-terminated entries (so entries must not contain
//! 0x00); binary mode concatenates raw entries and marks each entry's
//! last byte in an end-flag bit vector. Links hold byte offsets of entry
//! starts; exact duplicate entries share one offset.

use crate::config::{CacheLevel, TailMode};
use crate::error::{check_bounds, NestrieError, Result};
use crate::io::{DataInput, DataOutput, SliceDataInput};
use crate::succinct::bit_vector::checked_usize;
use crate::succinct::storage::ByteBuf;
use crate::succinct::BitVector;

const TEXT_MODE_TAG: u32 = 1;
const BINARY_MODE_TAG: u32 = 2;

/// Flat store of collapsed edge labels
#[derive(Debug, Clone)]
pub(crate) struct TailStore<'a> {
    mode: TailMode,
    bytes: ByteBuf<'a>,
    /// Marks the last byte of each entry; only populated in binary mode
    end_flags: BitVector<'a>,
}

impl<'a> TailStore<'a> {
    /// Create an empty store in the given mode
    pub fn new(mode: TailMode) -> Self {
        Self { mode, bytes: ByteBuf::new(), end_flags: BitVector::new() }
    }

    /// The encoding mode fixed at build time
    pub fn mode(&self) -> TailMode {
        self.mode
    }

    /// Total stored bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Append an entry and return its byte offset
    pub fn append(&mut self, entry: &[u8]) -> Result<u64> {
        if entry.is_empty() {
            return Err(NestrieError::logic("empty tail entry"));
        }
        let offset = self.bytes.len() as u64;
        match self.mode {
            TailMode::Text => {
                if entry.contains(&0) {
                    return Err(NestrieError::invalid_argument(
                        "text tail cannot store entries containing NUL",
                    ));
                }
                let bytes = self.bytes.as_mut_vec()?;
                bytes.extend_from_slice(entry);
                bytes.push(0);
            }
            TailMode::Binary => {
                self.bytes.as_mut_vec()?.extend_from_slice(entry);
                for i in 0..entry.len() {
                    self.end_flags.push(i + 1 == entry.len())?;
                }
            }
        }
        Ok(offset)
    }

    /// The entry starting at `offset`
    pub fn get(&self, offset: usize) -> Result<&[u8]> {
        let bytes = self.bytes.as_slice();
        check_bounds(offset, bytes.len())?;
        let mut end = offset;
        match self.mode {
            TailMode::Text => {
                while end < bytes.len() && bytes[end] != 0 {
                    end += 1;
                }
            }
            TailMode::Binary => {
                while end < bytes.len() && !self.end_flags.get_bit(end) {
                    end += 1;
                }
                end += 1;
            }
        }
        if end > bytes.len() {
            return Err(NestrieError::format("tail entry runs past the store"));
        }
        Ok(&bytes[offset..end])
    }

    /// Heap bytes held by this store
    pub fn heap_bytes(&self) -> usize {
        self.bytes.heap_bytes() + self.end_flags.heap_bytes()
    }

    /// Serialized size in bytes
    pub fn io_size(&self) -> usize {
        let data = 8 + 8 + self.bytes.len().div_ceil(8) * 8;
        match self.mode {
            TailMode::Text => data,
            TailMode::Binary => data + self.end_flags.io_size(),
        }
    }

    /// Write the store in frame layout
    pub fn write_into<W: DataOutput + ?Sized>(&self, out: &mut W) -> Result<()> {
        let tag = match self.mode {
            TailMode::Text => TEXT_MODE_TAG,
            TailMode::Binary => BINARY_MODE_TAG,
        };
        out.write_u32(tag)?;
        out.write_u32(0)?;
        out.write_u64(self.bytes.len() as u64)?;
        out.write_bytes(self.bytes.as_slice())?;
        write_padding(out, self.bytes.len())?;
        if self.mode == TailMode::Binary {
            self.end_flags.write_into(out)?;
        }
        Ok(())
    }

    /// Read an owned store from frame layout
    pub fn read_from<I: DataInput + ?Sized>(
        input: &mut I,
        level: CacheLevel,
    ) -> Result<TailStore<'static>> {
        let mode = read_mode_tag(input)?;
        let len = checked_usize(input.read_u64()?)?;
        let bytes = input.read_vec(len)?;
        input.skip(padding_for(len))?;
        let end_flags = match mode {
            TailMode::Text => BitVector::new(),
            TailMode::Binary => BitVector::read_from(input, level)?,
        };
        let store = TailStore { mode, bytes: ByteBuf::from(bytes), end_flags };
        store.validate()?;
        Ok(store)
    }

    /// Bind a zero-copy view over frame layout
    pub fn map_from(input: &mut SliceDataInput<'a>, level: CacheLevel) -> Result<TailStore<'a>> {
        let mode = read_mode_tag(input)?;
        let len = checked_usize(input.read_u64()?)?;
        let bytes = ByteBuf::borrowed(input.read_slice(len)?);
        input.skip(padding_for(len))?;
        let end_flags = match mode {
            TailMode::Text => BitVector::new(),
            TailMode::Binary => BitVector::map_from(input, level)?,
        };
        let store = TailStore { mode, bytes, end_flags };
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> Result<()> {
        if self.mode == TailMode::Binary && self.end_flags.len() != self.bytes.len() {
            return Err(NestrieError::format("tail end flags do not match tail length"));
        }
        Ok(())
    }
}

fn read_mode_tag<I: DataInput + ?Sized>(input: &mut I) -> Result<TailMode> {
    let tag = input.read_u32()?;
    input.read_u32()?;
    match tag {
        TEXT_MODE_TAG => Ok(TailMode::Text),
        BINARY_MODE_TAG => Ok(TailMode::Binary),
        _ => Err(NestrieError::format(format!("unknown tail mode tag {}", tag))),
    }
}

#[inline]
fn padding_for(len: usize) -> usize {
    len.div_ceil(8) * 8 - len
}

fn write_padding<W: DataOutput + ?Sized>(out: &mut W, len: usize) -> Result<()> {
    const ZEROS: [u8; 8] = [0; 8];
    out.write_bytes(&ZEROS[..padding_for(len)])
}
