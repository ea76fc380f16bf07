//! # nestrie: a recursively-indexed succinct trie
//!
//! `nestrie` is a static, compressed associative container mapping a set
//! of arbitrary byte strings onto the dense id range `[0, N)`. It
//! answers four query kinds through reusable [`Agent`] cursors: exact
//! lookup, reverse lookup (id to key), common-prefix enumeration, and
//! predictive (subtree) enumeration.
//!
//! The trie body is a LOUDS bit sequence with rank/select acceleration;
//! multi-byte edge labels are collapsed and recursively indexed by
//! further tries over their reversed text, so shared suffixes compress
//! as well as shared prefixes. The whole structure serializes to a flat
//! little-endian frame that can be read back or bound zero-copy over a
//! memory mapping.
//!
//! ## Quick start
//!
//! ```rust
//! use nestrie::{Agent, Config, Keyset, Trie};
//!
//! let mut keyset = Keyset::new();
//! for key in [&b"app"[..], b"apple", b"apply", b"banana"] {
//!     keyset.push(key)?;
//! }
//! let trie = Trie::build(&mut keyset, Config::default())?;
//!
//! let mut agent = Agent::new();
//! agent.set_query(b"app");
//! while trie.predictive_search(&mut agent) {
//!     println!("{} -> {:?}", agent.key_id(), agent.key());
//! }
//! # Ok::<(), nestrie::NestrieError>(())
//! ```
//!
//! ## Configuration
//!
//! [`Config`] packs four independent knobs into one flag word: the
//! nesting depth (`num_tries`, 1..=7), the rank/select cache density
//! ([`CacheLevel`]), the tail encoding ([`TailMode`]), and the sibling
//! ordering ([`NodeOrder`]). All combinations answer queries
//! identically up to enumeration order; they trade space, speed, and
//! result streaming order.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod agent;
pub mod config;
pub mod error;
pub mod io;
pub mod keyset;
pub mod succinct;
pub mod trie;

pub use agent::Agent;
pub use config::{CacheLevel, Config, ConfigBuilder, NodeOrder, TailMode};
pub use error::{NestrieError, Result};
pub use keyset::{Keyset, MAX_KEY_LEN};
pub use trie::Trie;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_re_exports() {
        let _agent = Agent::new();
        let _keyset = Keyset::new();
        let _trie = Trie::new();
        let _config = Config::default();
        let _err = NestrieError::invalid_argument("probe");
        assert!(std::any::type_name::<Result<()>>().contains("NestrieError"));
    }

    #[test]
    fn test_trie_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Trie<'static>>();
        assert_send_sync::<Keyset>();
        assert_send_sync::<Agent>();
    }
}
