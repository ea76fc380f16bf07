//! Query agents
//!
//! An agent is a reusable cursor: it carries the query, receives the
//! result of each call, and for the enumeration queries holds the
//! resumption state between calls. Distinct agents may query the same
//! trie from different threads; a single agent belongs to one thread at
//! a time.

/// Resumption state of an enumeration in progress
#[derive(Debug, Clone)]
pub(crate) enum SearchState {
    /// No search started since the last `set_query`
    Fresh,
    /// Common-prefix search: current node and consumed query bytes
    CommonPrefix { node: u32, pos: usize },
    /// Predictive search: DFS frontier over the matched subtree
    Predictive { frames: Vec<PredictiveFrame> },
    /// The stream is exhausted; further calls return no results
    Exhausted,
}

/// One frame of the predictive DFS frontier
#[derive(Debug, Clone)]
pub(crate) struct PredictiveFrame {
    /// Node this frame enumerates
    pub node: u32,
    /// LOUDS position of the next child edge to try
    pub child_pos: usize,
    /// Length of the key buffer up to and including this node's label
    pub key_len: usize,
    /// Whether this node's own terminal has been reported
    pub visited: bool,
}

/// A reusable query cursor
///
/// # Examples
///
/// ```rust
/// use nestrie::{Agent, Keyset, Trie};
///
/// let mut keyset = Keyset::new();
/// for key in [&b"app"[..], b"apple", b"banana"] {
///     keyset.push(key)?;
/// }
/// let trie = Trie::build(&mut keyset, Default::default())?;
///
/// let mut agent = Agent::new();
/// agent.set_query(b"apple");
/// while trie.common_prefix_search(&mut agent) {
///     println!("{} -> {:?}", agent.key_id(), agent.key());
/// }
/// # Ok::<(), nestrie::NestrieError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Agent {
    pub(crate) query: Vec<u8>,
    pub(crate) query_id: u32,
    pub(crate) key_buf: Vec<u8>,
    pub(crate) key_len: usize,
    pub(crate) key_id: u32,
    pub(crate) state: SearchState,
}

impl Agent {
    /// Create a fresh agent with no query
    pub fn new() -> Self {
        Self {
            query: Vec::new(),
            query_id: 0,
            key_buf: Vec::new(),
            key_len: 0,
            key_id: 0,
            state: SearchState::Fresh,
        }
    }

    /// Set the query bytes and reset any enumeration in progress
    pub fn set_query(&mut self, query: &[u8]) {
        self.query.clear();
        self.query.extend_from_slice(query);
        self.reset_result();
    }

    /// Set a key id for reverse lookup and reset any enumeration
    pub fn set_query_id(&mut self, id: u32) {
        self.query_id = id;
        self.reset_result();
    }

    /// The current query bytes
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// The key bytes of the last result
    ///
    /// Valid until the next call on this agent.
    pub fn key(&self) -> &[u8] {
        &self.key_buf[..self.key_len]
    }

    /// The key id of the last result
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    fn reset_result(&mut self) {
        self.key_buf.clear();
        self.key_len = 0;
        self.key_id = 0;
        self.state = SearchState::Fresh;
    }

    /// Make the first `len` query bytes the current result key
    pub(crate) fn set_key_from_query(&mut self, len: usize) {
        let query = std::mem::take(&mut self.query);
        self.key_buf.clear();
        self.key_buf.extend_from_slice(&query[..len]);
        self.query = query;
        self.key_len = len;
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_query_resets_state() {
        let mut agent = Agent::new();
        agent.set_query(b"abc");
        agent.state = SearchState::Exhausted;
        agent.key_buf.extend_from_slice(b"xyz");
        agent.key_len = 3;

        agent.set_query(b"def");
        assert_eq!(agent.query(), b"def");
        assert_eq!(agent.key(), b"");
        assert!(matches!(agent.state, SearchState::Fresh));
    }

    #[test]
    fn test_query_id() {
        let mut agent = Agent::new();
        agent.set_query_id(42);
        assert_eq!(agent.query_id, 42);
        assert!(matches!(agent.state, SearchState::Fresh));
    }
}
