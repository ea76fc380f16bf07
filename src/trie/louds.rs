//! A single LOUDS trie layer
//!
//! The tree shape lives in a level-order unary degree sequence with a
//! super-root prefix: the sequence opens with "10" for the super root,
//! then each node in BFS order contributes one 1-bit per child followed
//! by a 0. A shape over n nodes therefore holds exactly n ones and n+1
//! zeros.
//!
//! Node ids are BFS ranks (root = 0). With 0-indexed select:
//!   - children of v start at louds position select0(v) + 1
//!   - a child 1-bit at position p denotes node p - v - 1
//!   - the parent of v (v > 0) is select1(v) - v - 1

use crate::config::CacheLevel;
use crate::error::{NestrieError, Result};
use crate::io::{DataInput, DataOutput, SliceDataInput};
use crate::succinct::bit_vector::checked_usize;
use crate::succinct::storage::ByteBuf;
use crate::succinct::{BitVector, IntVector};
use crate::trie::tail::TailStore;

/// One layer of the recursive trie forest
#[derive(Debug, Clone)]
pub(crate) struct LoudsLayer<'a> {
    /// Tree shape in level order
    pub louds: BitVector<'a>,
    /// Terminal markers, indexed by node id
    pub terminal_flags: BitVector<'a>,
    /// First label byte per node; slot 0 (the root) is unused
    pub labels: ByteBuf<'a>,
    /// Marks nodes whose edge label is stored indirectly
    pub link_flags: BitVector<'a>,
    /// Link values for flagged nodes, in node-id order
    pub links: IntVector<'a>,
    /// Collapsed-label store; present only on the deepest layer
    pub tail: Option<TailStore<'a>>,
}

impl<'a> LoudsLayer<'a> {
    /// Number of nodes, the root included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of terminal nodes
    #[inline]
    pub fn num_terminals(&self) -> usize {
        self.terminal_flags.count_ones()
    }

    /// Whether a key ends at `v`
    #[inline]
    pub fn is_terminal(&self, v: u32) -> bool {
        self.terminal_flags.get_bit(v as usize)
    }

    /// Rank of `v` among terminal nodes; only meaningful when terminal
    #[inline]
    pub fn terminal_id(&self, v: u32) -> u32 {
        self.terminal_flags.rank1(v as usize) as u32
    }

    /// Terminal node carrying key id `id`
    #[inline]
    pub fn node_from_terminal(&self, id: usize) -> Result<u32> {
        Ok(self.terminal_flags.select1(id)? as u32)
    }

    /// Whether the edge into `v` is a link
    #[inline]
    pub fn has_link(&self, v: u32) -> bool {
        self.link_flags.get_bit(v as usize)
    }

    /// Link value of a flagged node
    #[inline]
    pub fn link(&self, v: u32) -> Result<u64> {
        let rank = self.link_flags.rank1(v as usize);
        self.links
            .get(rank)
            .ok_or_else(|| NestrieError::logic("link rank out of range"))
    }

    /// First byte of the edge label into `v`
    #[inline]
    pub fn label_byte(&self, v: u32) -> u8 {
        self.labels.as_slice()[v as usize]
    }

    /// LOUDS position of the first child edge of `v`
    #[inline]
    pub fn first_child_pos(&self, v: u32) -> Result<usize> {
        Ok(self.louds.select0(v as usize)? + 1)
    }

    /// Whether the LOUDS bit at `pos` marks a child edge
    #[inline]
    pub fn louds_bit(&self, pos: usize) -> bool {
        pos < self.louds.len() && self.louds.get_bit(pos)
    }

    /// Parent of `v`; the root has none
    #[inline]
    pub fn parent(&self, v: u32) -> Result<Option<u32>> {
        if v == 0 {
            return Ok(None);
        }
        let pos = self.louds.select1(v as usize)?;
        Ok(Some((pos - v as usize - 1) as u32))
    }

    /// Heap bytes held by this layer
    pub fn heap_bytes(&self) -> usize {
        self.louds.heap_bytes()
            + self.terminal_flags.heap_bytes()
            + self.labels.heap_bytes()
            + self.link_flags.heap_bytes()
            + self.links.heap_bytes()
            + self.tail.as_ref().map_or(0, |t| t.heap_bytes())
    }

    /// Serialized size in bytes
    pub fn io_size(&self) -> usize {
        self.louds.io_size()
            + self.terminal_flags.io_size()
            + 8
            + self.labels.len().div_ceil(8) * 8
            + self.link_flags.io_size()
            + self.links.io_size()
            + self.tail.as_ref().map_or(0, |t| t.io_size())
    }

    /// Write the layer in frame layout; `is_last` layers carry the tail
    pub fn write_into<W: DataOutput + ?Sized>(&self, out: &mut W, is_last: bool) -> Result<()> {
        self.louds.write_into(out)?;
        self.terminal_flags.write_into(out)?;
        out.write_u64(self.labels.len() as u64)?;
        out.write_bytes(self.labels.as_slice())?;
        let pad = self.labels.len().div_ceil(8) * 8 - self.labels.len();
        out.write_bytes(&[0u8; 8][..pad])?;
        self.link_flags.write_into(out)?;
        self.links.write_into(out)?;
        match (&self.tail, is_last) {
            (Some(tail), true) => tail.write_into(out)?,
            (None, false) => {}
            (Some(_), false) => {
                return Err(NestrieError::logic("tail on an inner layer"));
            }
            (None, true) => {
                return Err(NestrieError::logic("last layer without a tail store"));
            }
        }
        Ok(())
    }

    /// Read an owned layer from frame layout
    pub fn read_from<I: DataInput + ?Sized>(
        input: &mut I,
        level: CacheLevel,
        is_last: bool,
    ) -> Result<LoudsLayer<'static>> {
        let louds = BitVector::read_from(input, level)?;
        let terminal_flags = BitVector::read_from(input, level)?;
        let label_count = checked_usize(input.read_u64()?)?;
        let labels = input.read_vec(label_count)?;
        input.skip(label_count.div_ceil(8) * 8 - label_count)?;
        let link_flags = BitVector::read_from(input, level)?;
        let links = IntVector::read_from(input)?;
        let tail = if is_last {
            Some(TailStore::read_from(input, level)?)
        } else {
            None
        };
        let layer = LoudsLayer {
            louds,
            terminal_flags,
            labels: ByteBuf::from(labels),
            link_flags,
            links,
            tail,
        };
        layer.validate()?;
        Ok(layer)
    }

    /// Bind a zero-copy view over frame layout
    pub fn map_from(
        input: &mut SliceDataInput<'a>,
        level: CacheLevel,
        is_last: bool,
    ) -> Result<LoudsLayer<'a>> {
        let louds = BitVector::map_from(input, level)?;
        let terminal_flags = BitVector::map_from(input, level)?;
        let label_count = checked_usize(input.read_u64()?)?;
        let labels = ByteBuf::borrowed(input.read_slice(label_count)?);
        input.skip(label_count.div_ceil(8) * 8 - label_count)?;
        let link_flags = BitVector::map_from(input, level)?;
        let links = IntVector::map_from(input)?;
        let tail = if is_last {
            Some(TailStore::map_from(input, level)?)
        } else {
            None
        };
        let layer = LoudsLayer { louds, terminal_flags, labels, link_flags, links, tail };
        layer.validate()?;
        Ok(layer)
    }

    /// Cross-check the section sizes against each other
    pub fn validate(&self) -> Result<()> {
        let nodes = self.labels.len();
        if nodes == 0 {
            return Err(NestrieError::format("layer without a root node"));
        }
        if self.louds.count_ones() != nodes {
            return Err(NestrieError::format("louds ones do not match node count"));
        }
        if self.louds.len() != 2 * nodes + 1 {
            return Err(NestrieError::format("louds length does not match node count"));
        }
        if self.terminal_flags.len() != nodes {
            return Err(NestrieError::format("terminal flags do not match node count"));
        }
        if self.link_flags.len() != nodes {
            return Err(NestrieError::format("link flags do not match node count"));
        }
        if self.links.len() != self.link_flags.count_ones() {
            return Err(NestrieError::format("link values do not match link flags"));
        }
        Ok(())
    }
}
