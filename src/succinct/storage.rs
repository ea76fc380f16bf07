//! Owned/borrowed backing storage for succinct vectors
//!
//! Every persisted vector in the crate is backed by either a heap
//! allocation (built or read from a stream) or a borrowed slice of a
//! caller-held buffer (memory-mapped open). Mutation is gated on the
//! owned variant; borrowed views never copy.
//!
//! Borrowed word access decodes little-endian bytes instead of casting,
//! so mapped buffers need no particular alignment.

use crate::error::{NestrieError, Result};

/// Backing storage for a `u64` word array
#[derive(Debug, Clone)]
pub enum WordBuf<'a> {
    /// Heap-allocated words
    Owned(Vec<u64>),
    /// Borrowed little-endian bytes; length is a multiple of 8
    Borrowed(&'a [u8]),
}

impl<'a> WordBuf<'a> {
    /// Create empty owned storage
    pub fn new() -> Self {
        WordBuf::Owned(Vec::new())
    }

    /// Bind a borrowed view over little-endian words
    ///
    /// The byte length must be a multiple of 8.
    pub fn borrowed(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(NestrieError::format("word section length not a multiple of 8"));
        }
        Ok(WordBuf::Borrowed(bytes))
    }

    /// Number of words
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            WordBuf::Owned(v) => v.len(),
            WordBuf::Borrowed(b) => b.len() / 8,
        }
    }

    /// True when no words are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the word at `index`; panics when out of range
    #[inline]
    pub fn word(&self, index: usize) -> u64 {
        match self {
            WordBuf::Owned(v) => v[index],
            WordBuf::Borrowed(b) => {
                let chunk: [u8; 8] = b[index * 8..index * 8 + 8].try_into().unwrap();
                u64::from_le_bytes(chunk)
            }
        }
    }

    /// Whether this storage owns its allocation
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, WordBuf::Owned(_))
    }

    /// Mutable access to the owned words; logic error when borrowed
    pub fn as_mut_vec(&mut self) -> Result<&mut Vec<u64>> {
        match self {
            WordBuf::Owned(v) => Ok(v),
            WordBuf::Borrowed(_) => {
                Err(NestrieError::logic("cannot mutate a mapped (borrowed) vector"))
            }
        }
    }

    /// Heap bytes consumed by this storage
    pub fn heap_bytes(&self) -> usize {
        match self {
            WordBuf::Owned(v) => v.capacity() * 8,
            WordBuf::Borrowed(_) => 0,
        }
    }

    /// Write every word in little-endian order into `out`
    pub fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        match self {
            WordBuf::Owned(v) => {
                for w in v {
                    out.extend_from_slice(&w.to_le_bytes());
                }
            }
            WordBuf::Borrowed(b) => out.extend_from_slice(b),
        }
    }
}

impl Default for WordBuf<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u64>> for WordBuf<'_> {
    fn from(words: Vec<u64>) -> Self {
        WordBuf::Owned(words)
    }
}

/// Backing storage for a raw byte array
#[derive(Debug, Clone)]
pub enum ByteBuf<'a> {
    /// Heap-allocated bytes
    Owned(Vec<u8>),
    /// Borrowed view into a caller-held buffer
    Borrowed(&'a [u8]),
}

impl<'a> ByteBuf<'a> {
    /// Create empty owned storage
    pub fn new() -> Self {
        ByteBuf::Owned(Vec::new())
    }

    /// Bind a borrowed view
    pub fn borrowed(bytes: &'a [u8]) -> Self {
        ByteBuf::Borrowed(bytes)
    }

    /// The stored bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            ByteBuf::Owned(v) => v,
            ByteBuf::Borrowed(b) => b,
        }
    }

    /// Number of bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True when no bytes are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Whether this storage owns its allocation
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, ByteBuf::Owned(_))
    }

    /// Mutable access to the owned bytes; logic error when borrowed
    pub fn as_mut_vec(&mut self) -> Result<&mut Vec<u8>> {
        match self {
            ByteBuf::Owned(v) => Ok(v),
            ByteBuf::Borrowed(_) => {
                Err(NestrieError::logic("cannot mutate a mapped (borrowed) vector"))
            }
        }
    }

    /// Heap bytes consumed by this storage
    pub fn heap_bytes(&self) -> usize {
        match self {
            ByteBuf::Owned(v) => v.capacity(),
            ByteBuf::Borrowed(_) => 0,
        }
    }
}

impl Default for ByteBuf<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for ByteBuf<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        ByteBuf::Owned(bytes)
    }
}

/// Backing storage for a `u32` auxiliary table
///
/// Rank caches and select samples are `u32` arrays on disk; this mirrors
/// [`WordBuf`] at the narrower width.
#[derive(Debug, Clone)]
pub enum U32Buf<'a> {
    /// Heap-allocated entries
    Owned(Vec<u32>),
    /// Borrowed little-endian bytes; length is a multiple of 4
    Borrowed(&'a [u8]),
}

impl<'a> U32Buf<'a> {
    /// Create empty owned storage
    pub fn new() -> Self {
        U32Buf::Owned(Vec::new())
    }

    /// Bind a borrowed view over little-endian entries
    pub fn borrowed(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(NestrieError::format("u32 section length not a multiple of 4"));
        }
        Ok(U32Buf::Borrowed(bytes))
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            U32Buf::Owned(v) => v.len(),
            U32Buf::Borrowed(b) => b.len() / 4,
        }
    }

    /// True when no entries are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the entry at `index`; panics when out of range
    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        match self {
            U32Buf::Owned(v) => v[index],
            U32Buf::Borrowed(b) => {
                let chunk: [u8; 4] = b[index * 4..index * 4 + 4].try_into().unwrap();
                u32::from_le_bytes(chunk)
            }
        }
    }

    /// Heap bytes consumed by this storage
    pub fn heap_bytes(&self) -> usize {
        match self {
            U32Buf::Owned(v) => v.capacity() * 4,
            U32Buf::Borrowed(_) => 0,
        }
    }

    /// Write every entry in little-endian order into `out`
    pub fn extend_le_bytes(&self, out: &mut Vec<u8>) {
        match self {
            U32Buf::Owned(v) => {
                for x in v {
                    out.extend_from_slice(&x.to_le_bytes());
                }
            }
            U32Buf::Borrowed(b) => out.extend_from_slice(b),
        }
    }
}

impl Default for U32Buf<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u32>> for U32Buf<'_> {
    fn from(entries: Vec<u32>) -> Self {
        U32Buf::Owned(entries)
    }
}
