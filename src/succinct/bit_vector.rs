//! Bit vector with rank/select acceleration
//!
//! Stores bits packed into 64-bit little-endian words. While owned the
//! vector is growable; `build_index` freezes it with a rank cache (one
//! cumulative count per 256-bit block) and optional select sample tables,
//! after which `rank1`/`rank0`/`select0`/`select1` answer in near-constant
//! time. Without an index the same queries fall back to word scanning, so
//! results never depend on the cache level; only speed and table size do.

use crate::config::CacheLevel;
use crate::error::{NestrieError, Result};
use crate::io::{DataInput, DataOutput, SliceDataInput};
use crate::succinct::storage::{U32Buf, WordBuf};

const BITS_PER_WORD: usize = 64;
const BLOCK_BITS: usize = 256;
const WORDS_PER_BLOCK: usize = BLOCK_BITS / BITS_PER_WORD;

/// Rank cache plus optional select samples for a frozen bit vector
#[derive(Debug, Clone)]
struct RankSelectIndex<'a> {
    /// Cumulative rank1 at each 256-bit block start, plus a sentinel
    rank_blocks: U32Buf<'a>,
    /// Bit position of every S-th zero; empty when not built
    select0: U32Buf<'a>,
    /// Bit position of every S-th one; empty when not built
    select1: U32Buf<'a>,
    /// Sampled stride S, from the configured cache level
    sample_rate: usize,
}

/// A packed bit vector supporting rank and select queries
///
/// # Examples
///
/// ```rust
/// use nestrie::succinct::BitVector;
/// use nestrie::CacheLevel;
///
/// let mut bv = BitVector::new();
/// for i in 0..100 {
///     bv.push(i % 3 == 0)?;
/// }
/// bv.build_index(CacheLevel::Normal, true, true)?;
///
/// assert_eq!(bv.rank1(10), 4);
/// assert_eq!(bv.select1(3)?, 9);
/// # Ok::<(), nestrie::NestrieError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BitVector<'a> {
    words: WordBuf<'a>,
    len: usize,
    index: Option<RankSelectIndex<'a>>,
}

impl<'a> BitVector<'a> {
    /// Create a new empty bit vector
    pub fn new() -> Self {
        Self { words: WordBuf::new(), len: 0, index: None }
    }

    /// Create a bit vector with capacity for `capacity` bits
    pub fn with_capacity(capacity: usize) -> Self {
        let blocks = capacity.div_ceil(BITS_PER_WORD);
        Self {
            words: WordBuf::Owned(Vec::with_capacity(blocks)),
            len: 0,
            index: None,
        }
    }

    /// Number of bits
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no bits are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the bit at `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.get_bit(index))
    }

    #[inline]
    pub(crate) fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        (self.words.word(index / BITS_PER_WORD) >> (index % BITS_PER_WORD)) & 1 == 1
    }

    /// Append a bit; drops any built index
    pub fn push(&mut self, value: bool) -> Result<()> {
        let word_index = self.len / BITS_PER_WORD;
        let bit_index = self.len % BITS_PER_WORD;
        let words = self.words.as_mut_vec()?;
        if words.len() <= word_index {
            words.push(0);
        }
        if value {
            words[word_index] |= 1u64 << bit_index;
        }
        self.index = None;
        self.len += 1;
        Ok(())
    }

    /// Set the bit at `index`; drops any built index
    pub fn set(&mut self, index: usize, value: bool) -> Result<()> {
        if index >= self.len {
            return Err(NestrieError::bounds(index, self.len));
        }
        let word_index = index / BITS_PER_WORD;
        let bit_index = index % BITS_PER_WORD;
        let words = self.words.as_mut_vec()?;
        if value {
            words[word_index] |= 1u64 << bit_index;
        } else {
            words[word_index] &= !(1u64 << bit_index);
        }
        self.index = None;
        Ok(())
    }

    /// Total number of set bits
    pub fn count_ones(&self) -> usize {
        if let Some(index) = &self.index {
            return index.rank_blocks.get(index.rank_blocks.len() - 1) as usize;
        }
        let mut count = 0;
        for i in 0..self.words.len() {
            count += self.masked_word(i).count_ones() as usize;
        }
        count
    }

    /// Total number of clear bits
    #[inline]
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Word at `index` with bits beyond `len` cleared
    #[inline]
    fn masked_word(&self, word_index: usize) -> u64 {
        let word = self.words.word(word_index);
        let base = word_index * BITS_PER_WORD;
        if base + BITS_PER_WORD <= self.len {
            word
        } else {
            word & low_mask(self.len - base)
        }
    }

    /// Build the rank cache and the requested select sample tables
    ///
    /// Fails with a range error when the vector exceeds the 2^32-bit
    /// addressing limit of the auxiliary tables.
    pub fn build_index(
        &mut self,
        level: CacheLevel,
        want_select0: bool,
        want_select1: bool,
    ) -> Result<()> {
        if self.len > u32::MAX as usize {
            return Err(NestrieError::range("bit vector exceeds 2^32 bits"));
        }
        let sample_rate = level.select_sample_rate();
        let num_blocks = self.len.div_ceil(BLOCK_BITS);
        let mut rank_blocks = Vec::with_capacity(num_blocks + 1);
        let mut select0 = Vec::new();
        let mut select1 = Vec::new();
        let mut ones = 0usize;
        let mut zeros = 0usize;

        for block in 0..num_blocks {
            rank_blocks.push(ones as u32);
            for sub in 0..WORDS_PER_BLOCK {
                let base = block * BLOCK_BITS + sub * BITS_PER_WORD;
                if base >= self.len {
                    break;
                }
                let bits = (self.len - base).min(BITS_PER_WORD);
                let word = self.masked_word(block * WORDS_PER_BLOCK + sub);
                let word_ones = word.count_ones() as usize;
                let word_zeros = bits - word_ones;

                if want_select1 {
                    let mut target = select1.len() * sample_rate;
                    while target < ones + word_ones {
                        let pos = base + select_in_word(word, target - ones);
                        select1.push(pos as u32);
                        target += sample_rate;
                    }
                }
                if want_select0 {
                    let inverted = !word & low_mask(bits);
                    let mut target = select0.len() * sample_rate;
                    while target < zeros + word_zeros {
                        let pos = base + select_in_word(inverted, target - zeros);
                        select0.push(pos as u32);
                        target += sample_rate;
                    }
                }
                ones += word_ones;
                zeros += word_zeros;
            }
        }
        rank_blocks.push(ones as u32);

        self.index = Some(RankSelectIndex {
            rank_blocks: U32Buf::from(rank_blocks),
            select0: U32Buf::from(select0),
            select1: U32Buf::from(select1),
            sample_rate,
        });
        Ok(())
    }

    /// Count of set bits in `[0, pos)`
    pub fn rank1(&self, pos: usize) -> usize {
        let pos = pos.min(self.len);
        if pos == 0 {
            return 0;
        }
        let target_word = pos / BITS_PER_WORD;
        let mut rank;
        let mut word_index;
        if let Some(index) = &self.index {
            let block = pos / BLOCK_BITS;
            rank = index.rank_blocks.get(block) as usize;
            word_index = block * WORDS_PER_BLOCK;
        } else {
            rank = 0;
            word_index = 0;
        }
        while word_index < target_word {
            rank += self.words.word(word_index).count_ones() as usize;
            word_index += 1;
        }
        let bit_in_word = pos % BITS_PER_WORD;
        if bit_in_word > 0 {
            rank += (self.words.word(target_word) & low_mask(bit_in_word)).count_ones() as usize;
        }
        rank
    }

    /// Count of clear bits in `[0, pos)`
    #[inline]
    pub fn rank0(&self, pos: usize) -> usize {
        pos.min(self.len) - self.rank1(pos)
    }

    /// Position of the `(k+1)`-th set bit
    pub fn select1(&self, k: usize) -> Result<usize> {
        let ones = self.count_ones();
        if k >= ones {
            return Err(NestrieError::bounds(k, ones));
        }
        let Some(index) = &self.index else {
            return self.select1_scan(k);
        };
        let num_blocks = index.rank_blocks.len() - 1;

        // Select samples bound the binary search to a handful of blocks.
        let (mut lo, mut hi) = (0, num_blocks);
        if !index.select1.is_empty() {
            let sample = k / index.sample_rate;
            lo = index.select1.get(sample) as usize / BLOCK_BITS;
            if sample + 1 < index.select1.len() {
                hi = (index.select1.get(sample + 1) as usize / BLOCK_BITS + 1).min(num_blocks);
            }
        }
        while lo < hi {
            let mid = (lo + hi) / 2;
            if (index.rank_blocks.get(mid) as usize) <= k {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let block = lo - 1;
        let mut remaining = k - index.rank_blocks.get(block) as usize;
        for sub in 0..WORDS_PER_BLOCK {
            let word_index = block * WORDS_PER_BLOCK + sub;
            if word_index >= self.words.len() {
                break;
            }
            let word = self.masked_word(word_index);
            let word_ones = word.count_ones() as usize;
            if remaining < word_ones {
                return Ok(block * BLOCK_BITS + sub * BITS_PER_WORD + select_in_word(word, remaining));
            }
            remaining -= word_ones;
        }
        Err(NestrieError::logic("select1 index inconsistent"))
    }

    /// Position of the `(k+1)`-th clear bit
    pub fn select0(&self, k: usize) -> Result<usize> {
        let zeros = self.count_zeros();
        if k >= zeros {
            return Err(NestrieError::bounds(k, zeros));
        }
        let Some(index) = &self.index else {
            return self.select0_scan(k);
        };
        let num_blocks = index.rank_blocks.len() - 1;

        let (mut lo, mut hi) = (0, num_blocks);
        if !index.select0.is_empty() {
            let sample = k / index.sample_rate;
            lo = index.select0.get(sample) as usize / BLOCK_BITS;
            if sample + 1 < index.select0.len() {
                hi = (index.select0.get(sample + 1) as usize / BLOCK_BITS + 1).min(num_blocks);
            }
        }
        while lo < hi {
            let mid = (lo + hi) / 2;
            let zeros_at_mid = (mid * BLOCK_BITS).min(self.len) - index.rank_blocks.get(mid) as usize;
            if zeros_at_mid <= k {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let block = lo - 1;
        let zeros_at_block = (block * BLOCK_BITS).min(self.len) - index.rank_blocks.get(block) as usize;
        let mut remaining = k - zeros_at_block;
        for sub in 0..WORDS_PER_BLOCK {
            let word_index = block * WORDS_PER_BLOCK + sub;
            let base = block * BLOCK_BITS + sub * BITS_PER_WORD;
            if base >= self.len {
                break;
            }
            let bits = (self.len - base).min(BITS_PER_WORD);
            let inverted = !self.words.word(word_index) & low_mask(bits);
            let word_zeros = inverted.count_ones() as usize;
            if remaining < word_zeros {
                return Ok(base + select_in_word(inverted, remaining));
            }
            remaining -= word_zeros;
        }
        Err(NestrieError::logic("select0 index inconsistent"))
    }

    fn select1_scan(&self, k: usize) -> Result<usize> {
        let mut remaining = k;
        for word_index in 0..self.words.len() {
            let word = self.masked_word(word_index);
            let word_ones = word.count_ones() as usize;
            if remaining < word_ones {
                return Ok(word_index * BITS_PER_WORD + select_in_word(word, remaining));
            }
            remaining -= word_ones;
        }
        Err(NestrieError::bounds(k, self.count_ones()))
    }

    fn select0_scan(&self, k: usize) -> Result<usize> {
        let mut remaining = k;
        for word_index in 0..self.words.len() {
            let base = word_index * BITS_PER_WORD;
            let bits = (self.len - base).min(BITS_PER_WORD);
            let inverted = !self.words.word(word_index) & low_mask(bits);
            let word_zeros = inverted.count_ones() as usize;
            if remaining < word_zeros {
                return Ok(base + select_in_word(inverted, remaining));
            }
            remaining -= word_zeros;
        }
        Err(NestrieError::bounds(k, self.count_zeros()))
    }

    /// Heap bytes held by this vector
    pub fn heap_bytes(&self) -> usize {
        let mut total = self.words.heap_bytes();
        if let Some(index) = &self.index {
            total += index.rank_blocks.heap_bytes()
                + index.select0.heap_bytes()
                + index.select1.heap_bytes();
        }
        total
    }

    /// Serialized size in bytes
    pub fn io_size(&self) -> usize {
        let words = self.len.div_ceil(BITS_PER_WORD) * 8;
        let (rank, sel0, sel1) = match &self.index {
            Some(index) => (
                padded_u32_bytes(index.rank_blocks.len()),
                padded_u32_bytes(index.select0.len()),
                padded_u32_bytes(index.select1.len()),
            ),
            None => (0, 0, 0),
        };
        8 + words + 8 + rank + 8 + sel0 + 8 + sel1
    }

    /// Write the vector and its auxiliary tables in frame layout
    pub fn write_into<W: DataOutput + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_u64(self.len as u64)?;
        for i in 0..self.words.len() {
            out.write_u64(self.words.word(i))?;
        }
        match &self.index {
            Some(index) => {
                write_u32_section(out, &index.rank_blocks)?;
                write_u32_section(out, &index.select0)?;
                write_u32_section(out, &index.select1)?;
            }
            None => {
                out.write_u64(0)?;
                out.write_u64(0)?;
                out.write_u64(0)?;
            }
        }
        Ok(())
    }

    /// Read an owned vector from frame layout
    pub fn read_from<I: DataInput + ?Sized>(input: &mut I, level: CacheLevel) -> Result<BitVector<'static>> {
        let len = checked_usize(input.read_u64()?)?;
        let num_words = len.div_ceil(BITS_PER_WORD);
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(input.read_u64()?);
        }
        let rank_blocks = read_u32_section(input)?;
        let select0 = read_u32_section(input)?;
        let select1 = read_u32_section(input)?;

        let index = if rank_blocks.is_empty() {
            None
        } else {
            if rank_blocks.len() != len.div_ceil(BLOCK_BITS) + 1 {
                return Err(NestrieError::format("rank cache size does not match bit count"));
            }
            Some(RankSelectIndex {
                rank_blocks: U32Buf::from(rank_blocks),
                select0: U32Buf::from(select0),
                select1: U32Buf::from(select1),
                sample_rate: level.select_sample_rate(),
            })
        };
        Ok(BitVector { words: WordBuf::from(words), len, index })
    }

    /// Bind a zero-copy view over frame layout
    pub fn map_from(input: &mut SliceDataInput<'a>, level: CacheLevel) -> Result<BitVector<'a>> {
        let len = checked_usize(input.read_u64()?)?;
        let num_words = len.div_ceil(BITS_PER_WORD);
        let words = WordBuf::borrowed(input.read_slice(num_words * 8)?)?;
        let rank_blocks = map_u32_section(input)?;
        let select0 = map_u32_section(input)?;
        let select1 = map_u32_section(input)?;

        let index = if rank_blocks.is_empty() {
            None
        } else {
            if rank_blocks.len() != len.div_ceil(BLOCK_BITS) + 1 {
                return Err(NestrieError::format("rank cache size does not match bit count"));
            }
            Some(RankSelectIndex {
                rank_blocks,
                select0,
                select1,
                sample_rate: level.select_sample_rate(),
            })
        };
        Ok(BitVector { words, len, index })
    }
}

impl Default for BitVector<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn low_mask(bits: usize) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

#[inline]
fn padded_u32_bytes(count: usize) -> usize {
    (count * 4).div_ceil(8) * 8
}

fn write_u32_section<W: DataOutput + ?Sized>(out: &mut W, entries: &U32Buf<'_>) -> Result<()> {
    out.write_u64(entries.len() as u64)?;
    for i in 0..entries.len() {
        out.write_u32(entries.get(i))?;
    }
    if entries.len() % 2 == 1 {
        out.write_u32(0)?;
    }
    Ok(())
}

fn read_u32_section<I: DataInput + ?Sized>(input: &mut I) -> Result<Vec<u32>> {
    let count = checked_usize(input.read_u64()?)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(input.read_u32()?);
    }
    if count % 2 == 1 {
        input.read_u32()?;
    }
    Ok(entries)
}

fn map_u32_section<'a>(input: &mut SliceDataInput<'a>) -> Result<U32Buf<'a>> {
    let count = checked_usize(input.read_u64()?)?;
    let entries = U32Buf::borrowed(input.read_slice(count * 4)?)?;
    if count % 2 == 1 {
        input.skip(4)?;
    }
    Ok(entries)
}

#[inline]
pub(crate) fn checked_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| NestrieError::range("size exceeds address space"))
}

/// Position of the `(k+1)`-th set bit within a word
#[inline]
fn select_in_word(word: u64, k: usize) -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("bmi2") {
            // pdep deposits the k-th mask bit onto the k-th set bit of word
            let deposited = unsafe { core::arch::x86_64::_pdep_u64(1u64 << k, word) };
            return deposited.trailing_zeros() as usize;
        }
    }
    let mut w = word;
    for _ in 0..k {
        w &= w - 1;
    }
    w.trailing_zeros() as usize
}
