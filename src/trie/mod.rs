//! The trie container: build, query, and persist
//!
//! A [`Trie`] maps a static keyset of byte strings onto the dense id
//! range `[0, num_keys)`. Internally it is a forest of LOUDS layers:
//! layer 0 indexes the keys themselves and each deeper layer indexes the
//! reversed multi-byte edge labels of the one above, until the configured
//! depth runs out and remaining labels land in a flat tail store.
//!
//! Built tries are immutable. Any number of threads may query one
//! concurrently through their own [`Agent`](crate::Agent)s.

mod builder;
mod louds;
mod search;
mod tail;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::config::{CacheLevel, Config, NodeOrder, TailMode};
use crate::error::{NestrieError, Result};
use crate::io::{DataInput, DataOutput, ReaderDataInput, SliceDataInput, WriterDataOutput};
use crate::keyset::Keyset;
use louds::LoudsLayer;

/// Magic bytes opening every persisted frame
pub const MAGIC: [u8; 8] = *b"nestrie\0";

/// A static, compressed map from byte keys to dense integer ids
///
/// The lifetime parameter tracks borrowed storage: tries produced by
/// [`Trie::build`], [`Trie::read`], or [`Trie::load`] own their data and
/// are `'static`; tries produced by [`Trie::map`] borrow the caller's
/// buffer without copying payload.
///
/// # Examples
///
/// ```rust
/// use nestrie::{Agent, Config, Keyset, Trie};
///
/// let mut keyset = Keyset::new();
/// for key in [&b"app"[..], b"apple", b"banana"] {
///     keyset.push(key)?;
/// }
/// let trie = Trie::build(&mut keyset, Config::default())?;
/// assert_eq!(trie.num_keys(), 3);
///
/// let mut agent = Agent::new();
/// agent.set_query(b"apple");
/// assert!(trie.lookup(&mut agent));
///
/// agent.set_query_id(agent.key_id());
/// trie.reverse_lookup(&mut agent)?;
/// assert_eq!(agent.key(), b"apple");
/// # Ok::<(), nestrie::NestrieError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Trie<'a> {
    config: Config,
    layers: Vec<LoudsLayer<'a>>,
    num_keys: usize,
}

impl Trie<'static> {
    /// Build a trie from a keyset
    ///
    /// Duplicate keys are coalesced with their weights summed. On success
    /// every keyset entry is annotated with its assigned id (see
    /// [`Keyset::key_id`]). On failure the keyset keeps its keys and no
    /// trie is produced.
    pub fn build(keyset: &mut Keyset, config: Config) -> Result<Self> {
        let output = builder::build(keyset, config)?;
        Ok(Self { config, layers: output.layers, num_keys: output.num_keys })
    }

    /// Read an owned trie from a frame
    pub fn read<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        let (config, num_layers) = read_header(input)?;
        let mut layers = Vec::with_capacity(num_layers);
        for i in 0..num_layers {
            layers.push(LoudsLayer::read_from(
                input,
                config.cache_level(),
                i + 1 == num_layers,
            )?);
        }
        Self::assemble(config, layers)
    }

    /// Read an owned trie from the file at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut input = ReaderDataInput::new(BufReader::new(file));
        Self::read(&mut input)
    }
}

impl<'a> Trie<'a> {
    /// Create an unbuilt trie
    ///
    /// It answers no queries and cannot be written; building or reading
    /// replaces it wholesale.
    pub fn new() -> Self {
        Self { config: Config::default(), layers: Vec::new(), num_keys: 0 }
    }

    /// Bind a trie over a serialized frame without copying payload
    ///
    /// The resulting trie is read-only and borrows `bytes`, typically a
    /// memory mapping the caller keeps alive (see
    /// [`io::MemoryMappedInput`](crate::io::MemoryMappedInput)).
    pub fn map(bytes: &'a [u8]) -> Result<Trie<'a>> {
        let mut input = SliceDataInput::new(bytes);
        let (config, num_layers) = read_header(&mut input)?;
        let mut layers = Vec::with_capacity(num_layers);
        for i in 0..num_layers {
            layers.push(LoudsLayer::map_from(
                &mut input,
                config.cache_level(),
                i + 1 == num_layers,
            )?);
        }
        Self::assemble(config, layers)
    }

    fn assemble(config: Config, layers: Vec<LoudsLayer<'a>>) -> Result<Trie<'a>> {
        if let Some(tail) = layers.last().and_then(|l| l.tail.as_ref()) {
            if tail.mode() != config.tail_mode() {
                return Err(NestrieError::format("tail mode disagrees with header flags"));
            }
        }
        let trie = Trie { config, num_keys: layers[0].num_terminals(), layers };
        trie.validate_links()?;
        log::debug!(
            "opened trie: {} keys, {} layers, {} nodes",
            trie.num_keys,
            trie.layers.len(),
            trie.num_nodes()
        );
        Ok(trie)
    }

    /// Links on inner layers must land on next-layer key ids; on the last
    /// layer they are offsets into the tail.
    fn validate_links(&self) -> Result<()> {
        for (i, layer) in self.layers.iter().enumerate() {
            let is_last = i + 1 == self.layers.len();
            let bound = if is_last {
                match &layer.tail {
                    Some(tail) => tail.len() as u64,
                    None => return Err(NestrieError::format("last layer without a tail store")),
                }
            } else {
                self.layers[i + 1].num_terminals() as u64
            };
            for j in 0..layer.links.len() {
                let value = layer
                    .links
                    .get(j)
                    .ok_or_else(|| NestrieError::format("link table shorter than link flags"))?;
                if value >= bound {
                    return Err(NestrieError::format(format!(
                        "link {} on layer {} out of range ({} >= {})",
                        j, i, value, bound
                    )));
                }
            }
        }
        Ok(())
    }

    /// Write the trie as a self-describing frame
    pub fn write<W: DataOutput + ?Sized>(&self, out: &mut W) -> Result<()> {
        if self.layers.is_empty() {
            return Err(NestrieError::logic("write on an unbuilt trie"));
        }
        out.write_bytes(&MAGIC)?;
        out.write_u32(self.config.flags())?;
        out.write_u32(self.layers.len() as u32)?;
        for (i, layer) in self.layers.iter().enumerate() {
            layer.write_into(out, i + 1 == self.layers.len())?;
        }
        out.flush()
    }

    /// Write the trie to the file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut out = WriterDataOutput::new(BufWriter::new(file));
        self.write(&mut out)
    }

    /// Number of layers actually built (at most the configured depth)
    pub fn num_tries(&self) -> usize {
        self.layers.len()
    }

    /// Number of distinct keys
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    /// Total nodes across all layers, roots included
    pub fn num_nodes(&self) -> usize {
        self.layers.iter().map(|l| l.node_count()).sum()
    }

    /// True when the trie holds no keys
    pub fn is_empty(&self) -> bool {
        self.num_keys == 0
    }

    /// Number of keys (alias kept for symmetry with collection types)
    pub fn size(&self) -> usize {
        self.num_keys
    }

    /// The build configuration in force
    pub fn config(&self) -> Config {
        self.config
    }

    /// The tail encoding in force
    pub fn tail_mode(&self) -> TailMode {
        self.config.tail_mode()
    }

    /// The sibling ordering discipline in force
    pub fn node_order(&self) -> NodeOrder {
        self.config.node_order()
    }

    /// The rank/select cache density in force
    pub fn cache_level(&self) -> CacheLevel {
        self.config.cache_level()
    }

    /// Bytes held in memory, borrowed payload excluded
    pub fn total_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.layers.iter().map(|l| l.heap_bytes()).sum::<usize>()
    }

    /// Bytes the trie occupies on disk
    pub fn io_size(&self) -> usize {
        if self.layers.is_empty() {
            return 0;
        }
        16 + self.layers.iter().map(|l| l.io_size()).sum::<usize>()
    }

}

impl Default for Trie<'static> {
    fn default() -> Self {
        Self::new()
    }
}

fn read_header<I: DataInput + ?Sized>(input: &mut I) -> Result<(Config, usize)> {
    let mut magic = [0u8; 8];
    input.read_bytes(&mut magic)?;
    if magic != MAGIC {
        return Err(NestrieError::format("unrecognized magic bytes"));
    }
    let config = Config::from_flags(input.read_u32()?)
        .map_err(|e| NestrieError::format(format!("invalid header flags: {}", e)))?;
    let num_layers = input.read_u32()? as usize;
    if num_layers == 0 {
        return Err(NestrieError::format("frame declares zero layers"));
    }
    if num_layers > config.num_tries() {
        return Err(NestrieError::format("layer count exceeds configured depth"));
    }
    Ok((config, num_layers))
}
