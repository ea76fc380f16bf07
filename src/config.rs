//! Build-time configuration for tries
//!
//! Configuration travels as a single `u32` bitfield so that it can be
//! embedded verbatim in the persisted frame header. Four independent
//! groups are packed into the field: the nesting depth, the rank/select
//! cache density, the tail encoding, and the sibling ordering discipline.
//! A group left at zero resolves to its default; bits outside the
//! recognized mask are rejected.

use crate::error::{NestrieError, Result};

/// Bit mask of the nesting-depth group (valid depths are 1..=7)
pub const NUM_TRIES_MASK: u32 = 0x0000_007F;
/// Huge rank/select cache (densest sampling, fastest select)
pub const HUGE_CACHE: u32 = 0x0000_0080;
/// Large rank/select cache
pub const LARGE_CACHE: u32 = 0x0000_0100;
/// Normal rank/select cache (default)
pub const NORMAL_CACHE: u32 = 0x0000_0200;
/// Small rank/select cache
pub const SMALL_CACHE: u32 = 0x0000_0400;
/// Tiny rank/select cache (sparsest sampling, smallest tables)
pub const TINY_CACHE: u32 = 0x0000_0800;
/// Bit mask of the cache-level group
pub const CACHE_LEVEL_MASK: u32 = 0x0000_0F80;
/// NUL-terminated tail encoding
pub const TEXT_TAIL: u32 = 0x0000_1000;
/// End-flagged binary tail encoding (default)
pub const BINARY_TAIL: u32 = 0x0000_2000;
/// Bit mask of the tail-mode group
pub const TAIL_MODE_MASK: u32 = 0x0000_3000;
/// Siblings ordered by label byte
pub const LABEL_ORDER: u32 = 0x0001_0000;
/// Siblings ordered by aggregate weight, heaviest first (default)
pub const WEIGHT_ORDER: u32 = 0x0002_0000;
/// Bit mask of the node-order group
pub const NODE_ORDER_MASK: u32 = 0x0003_0000;
/// All recognized configuration bits
pub const CONFIG_MASK: u32 =
    NUM_TRIES_MASK | CACHE_LEVEL_MASK | TAIL_MODE_MASK | NODE_ORDER_MASK;

/// Default nesting depth
pub const DEFAULT_NUM_TRIES: u32 = 3;
/// Deepest supported nesting
pub const MAX_NUM_TRIES: u32 = 7;

/// Density of the rank/select auxiliary tables
///
/// The level trades table space for select speed; query results are
/// identical across levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheLevel {
    /// Sparsest sampling, smallest tables
    Tiny,
    /// Sparse sampling
    Small,
    /// Balanced sampling (default)
    Normal,
    /// Dense sampling
    Large,
    /// Densest sampling, fastest select
    Huge,
}

impl CacheLevel {
    /// Number of matching bits between consecutive select samples
    #[inline]
    pub fn select_sample_rate(self) -> usize {
        match self {
            CacheLevel::Tiny => 4096,
            CacheLevel::Small => 1024,
            CacheLevel::Normal => 512,
            CacheLevel::Large => 128,
            CacheLevel::Huge => 64,
        }
    }

    fn flag(self) -> u32 {
        match self {
            CacheLevel::Tiny => TINY_CACHE,
            CacheLevel::Small => SMALL_CACHE,
            CacheLevel::Normal => NORMAL_CACHE,
            CacheLevel::Large => LARGE_CACHE,
            CacheLevel::Huge => HUGE_CACHE,
        }
    }
}

/// Encoding of the tail byte store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TailMode {
    /// NUL-terminated entries; keys must not contain the byte 0x00
    Text,
    /// Length-delimited entries via an end-flag bit vector
    Binary,
}

impl TailMode {
    fn flag(self) -> u32 {
        match self {
            TailMode::Text => TEXT_TAIL,
            TailMode::Binary => BINARY_TAIL,
        }
    }
}

/// Sibling ordering and id-assignment discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeOrder {
    /// Siblings sorted by first label byte; enumeration is lexicographic
    Label,
    /// Siblings sorted by aggregate subtree weight descending, label
    /// ascending on ties; enumeration streams heavy subtrees first
    Weight,
}

impl NodeOrder {
    fn flag(self) -> u32 {
        match self {
            NodeOrder::Label => LABEL_ORDER,
            NodeOrder::Weight => WEIGHT_ORDER,
        }
    }
}

/// Parsed, validated build configuration
///
/// # Examples
///
/// ```rust
/// use nestrie::{Config, NodeOrder, TailMode};
///
/// let config = Config::builder()
///     .num_tries(2)
///     .node_order(NodeOrder::Label)
///     .build()?;
/// assert_eq!(config.num_tries(), 2);
/// assert_eq!(config.tail_mode(), TailMode::Binary);
/// # Ok::<(), nestrie::NestrieError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    flags: u32,
}

impl Config {
    /// Create a builder for assembling a configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parse a raw flag word, resolving zeroed groups to their defaults
    ///
    /// Fails with an invalid-argument error on bits outside the reserved
    /// mask, a depth above [`MAX_NUM_TRIES`], or several values set within
    /// one group.
    pub fn from_flags(config_flags: u32) -> Result<Self> {
        if config_flags & !CONFIG_MASK != 0 {
            return Err(NestrieError::invalid_argument(format!(
                "unrecognized config bits: {:#x}",
                config_flags & !CONFIG_MASK
            )));
        }

        let mut flags = 0u32;

        let num_tries = config_flags & NUM_TRIES_MASK;
        match num_tries {
            0 => flags |= DEFAULT_NUM_TRIES,
            1..=MAX_NUM_TRIES => flags |= num_tries,
            _ => {
                return Err(NestrieError::invalid_argument(format!(
                    "num_tries must be in 1..={}, got {}",
                    MAX_NUM_TRIES, num_tries
                )));
            }
        }

        match config_flags & CACHE_LEVEL_MASK {
            0 => flags |= NORMAL_CACHE,
            v @ (HUGE_CACHE | LARGE_CACHE | NORMAL_CACHE | SMALL_CACHE | TINY_CACHE) => flags |= v,
            _ => return Err(NestrieError::invalid_argument("undefined cache level")),
        }

        match config_flags & TAIL_MODE_MASK {
            0 => flags |= BINARY_TAIL,
            v @ (TEXT_TAIL | BINARY_TAIL) => flags |= v,
            _ => return Err(NestrieError::invalid_argument("undefined tail mode")),
        }

        match config_flags & NODE_ORDER_MASK {
            0 => flags |= WEIGHT_ORDER,
            v @ (LABEL_ORDER | WEIGHT_ORDER) => flags |= v,
            _ => return Err(NestrieError::invalid_argument("undefined node order")),
        }

        Ok(Self { flags })
    }

    /// The resolved flag word (all groups populated)
    #[inline]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Nesting depth of the trie forest
    #[inline]
    pub fn num_tries(&self) -> usize {
        (self.flags & NUM_TRIES_MASK) as usize
    }

    /// Rank/select cache density
    #[inline]
    pub fn cache_level(&self) -> CacheLevel {
        match self.flags & CACHE_LEVEL_MASK {
            TINY_CACHE => CacheLevel::Tiny,
            SMALL_CACHE => CacheLevel::Small,
            LARGE_CACHE => CacheLevel::Large,
            HUGE_CACHE => CacheLevel::Huge,
            _ => CacheLevel::Normal,
        }
    }

    /// Tail encoding
    #[inline]
    pub fn tail_mode(&self) -> TailMode {
        if self.flags & TAIL_MODE_MASK == TEXT_TAIL {
            TailMode::Text
        } else {
            TailMode::Binary
        }
    }

    /// Sibling ordering discipline
    #[inline]
    pub fn node_order(&self) -> NodeOrder {
        if self.flags & NODE_ORDER_MASK == LABEL_ORDER {
            NodeOrder::Label
        } else {
            NodeOrder::Weight
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_flags(0).expect("default flags are valid")
    }
}

/// Fluent builder for [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    num_tries: u32,
    cache_level: CacheLevel,
    tail_mode: TailMode,
    node_order: NodeOrder,
}

impl ConfigBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self {
            num_tries: DEFAULT_NUM_TRIES,
            cache_level: CacheLevel::Normal,
            tail_mode: TailMode::Binary,
            node_order: NodeOrder::Weight,
        }
    }

    /// Set the nesting depth (validated as 1..=7 by `build`)
    pub fn num_tries(mut self, num_tries: u32) -> Self {
        self.num_tries = num_tries;
        self
    }

    /// Set the rank/select cache density
    pub fn cache_level(mut self, level: CacheLevel) -> Self {
        self.cache_level = level;
        self
    }

    /// Set the tail encoding
    pub fn tail_mode(mut self, mode: TailMode) -> Self {
        self.tail_mode = mode;
        self
    }

    /// Set the sibling ordering discipline
    pub fn node_order(mut self, order: NodeOrder) -> Self {
        self.node_order = order;
        self
    }

    /// Validate and assemble the configuration
    pub fn build(self) -> Result<Config> {
        if self.num_tries == 0 || self.num_tries > MAX_NUM_TRIES {
            return Err(NestrieError::invalid_argument(format!(
                "num_tries must be in 1..={}, got {}",
                MAX_NUM_TRIES, self.num_tries
            )));
        }
        Config::from_flags(
            self.num_tries
                | self.cache_level.flag()
                | self.tail_mode.flag()
                | self.node_order.flag(),
        )
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
