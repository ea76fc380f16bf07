//! Query evaluation over the layered forest
//!
//! All four query kinds run on layer 0; multi-byte edge labels are
//! resolved on demand through deeper layers or the tail store. Because a
//! linked label was inserted reversed into the next layer, walking that
//! layer root-ward and emitting each edge reversed reproduces the label
//! in forward order.

use crate::agent::{Agent, PredictiveFrame, SearchState};
use crate::error::{NestrieError, Result};
use crate::trie::Trie;

impl<'a> Trie<'a> {
    /// Exact lookup of the agent's query
    ///
    /// On success the agent carries the matched key and its id.
    pub fn lookup(&self, agent: &mut Agent) -> bool {
        self.try_lookup(agent).unwrap_or(false)
    }

    /// Restore the key for the agent's query id
    ///
    /// Fails with a bounds error when the id is not below `num_keys`, and
    /// with a logic error on an empty trie.
    pub fn reverse_lookup(&self, agent: &mut Agent) -> Result<()> {
        if self.layers.is_empty() {
            return Err(NestrieError::logic("reverse lookup on an unbuilt trie"));
        }
        let id = agent.query_id as usize;
        if id >= self.num_keys {
            return Err(NestrieError::bounds(id, self.num_keys));
        }
        let node = self.layers[0].node_from_terminal(id)?;
        agent.key_buf.clear();
        self.append_key_forward(0, node, &mut agent.key_buf)?;
        agent.key_len = agent.key_buf.len();
        agent.key_id = agent.query_id;
        agent.state = SearchState::Fresh;
        Ok(())
    }

    /// Produce the next key that is a prefix of the query
    ///
    /// Returns `true` while results remain; each result is a terminal met
    /// on the query's path, shallowest first. The call after the last
    /// result returns `false`.
    pub fn common_prefix_search(&self, agent: &mut Agent) -> bool {
        self.try_common_prefix(agent).unwrap_or(false)
    }

    /// Produce the next key extending the query
    ///
    /// Returns `true` while results remain. Enumeration is depth-first in
    /// the built sibling order: lexicographic under label order,
    /// heaviest-subtree-first under weight order.
    pub fn predictive_search(&self, agent: &mut Agent) -> bool {
        self.try_predictive(agent).unwrap_or(false)
    }

    fn try_lookup(&self, agent: &mut Agent) -> Result<bool> {
        agent.state = SearchState::Fresh;
        if self.layers.is_empty() {
            return Ok(false);
        }
        let mut node = 0u32;
        let mut pos = 0usize;
        let mut scratch = Vec::new();
        while pos < agent.query.len() {
            match self.find_child(node, &agent.query[pos..], &mut scratch)? {
                Some((child, consumed)) => {
                    node = child;
                    pos += consumed;
                }
                None => return Ok(false),
            }
        }
        let layer = &self.layers[0];
        if !layer.is_terminal(node) {
            return Ok(false);
        }
        let id = layer.terminal_id(node);
        agent.set_key_from_query(agent.query.len());
        agent.key_id = id;
        Ok(true)
    }

    fn try_common_prefix(&self, agent: &mut Agent) -> Result<bool> {
        let (mut node, mut pos) = match std::mem::replace(&mut agent.state, SearchState::Exhausted)
        {
            SearchState::CommonPrefix { node, pos } => (node, pos),
            SearchState::Exhausted => return Ok(false),
            _ => {
                if self.layers.is_empty() {
                    return Ok(false);
                }
                let layer = &self.layers[0];
                if layer.is_terminal(0) {
                    // The empty key is a prefix of every query.
                    let id = layer.terminal_id(0);
                    agent.set_key_from_query(0);
                    agent.key_id = id;
                    agent.state = SearchState::CommonPrefix { node: 0, pos: 0 };
                    return Ok(true);
                }
                (0, 0)
            }
        };
        if self.layers.is_empty() {
            return Ok(false);
        }
        let layer = &self.layers[0];
        let mut scratch = Vec::new();
        while pos < agent.query.len() {
            match self.find_child(node, &agent.query[pos..], &mut scratch)? {
                Some((child, consumed)) => {
                    node = child;
                    pos += consumed;
                    if layer.is_terminal(child) {
                        let id = layer.terminal_id(child);
                        agent.set_key_from_query(pos);
                        agent.key_id = id;
                        agent.state = SearchState::CommonPrefix { node, pos };
                        return Ok(true);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(false)
    }

    fn try_predictive(&self, agent: &mut Agent) -> Result<bool> {
        let mut frames = match std::mem::replace(&mut agent.state, SearchState::Exhausted) {
            SearchState::Predictive { frames } => frames,
            SearchState::Exhausted => return Ok(false),
            _ => match self.start_predictive(agent)? {
                Some(frames) => frames,
                None => return Ok(false),
            },
        };
        if self.layers.is_empty() {
            return Ok(false);
        }
        let layer = &self.layers[0];
        loop {
            let (node, child_pos, key_len, visited) = match frames.last() {
                Some(f) => (f.node, f.child_pos, f.key_len, f.visited),
                None => return Ok(false),
            };
            if !visited {
                if let Some(f) = frames.last_mut() {
                    f.visited = true;
                }
                if layer.is_terminal(node) {
                    let id = layer.terminal_id(node);
                    agent.key_id = id;
                    agent.key_len = key_len;
                    agent.state = SearchState::Predictive { frames };
                    return Ok(true);
                }
            }
            if layer.louds_bit(child_pos) {
                if let Some(f) = frames.last_mut() {
                    f.child_pos += 1;
                }
                let child = (child_pos - node as usize - 1) as u32;
                agent.key_buf.truncate(key_len);
                self.append_label_forward(0, child, &mut agent.key_buf)?;
                frames.push(PredictiveFrame {
                    node: child,
                    child_pos: layer.first_child_pos(child)?,
                    key_len: agent.key_buf.len(),
                    visited: false,
                });
            } else {
                frames.pop();
            }
        }
    }

    /// Descend to the deepest node whose spelled path extends the query;
    /// `None` when the query is not a prefix of any stored path.
    fn start_predictive(&self, agent: &mut Agent) -> Result<Option<Vec<PredictiveFrame>>> {
        if self.layers.is_empty() {
            return Ok(None);
        }
        let layer = &self.layers[0];
        let mut node = 0u32;
        let mut pos = 0usize;
        let mut scratch = Vec::new();
        let mut overhang: Vec<u8> = Vec::new();
        while pos < agent.query.len() {
            let rest_len = agent.query.len() - pos;
            match self.find_child_predictive(node, &agent.query[pos..], &mut scratch)? {
                Some((child, consumed, resolved)) => {
                    node = child;
                    if consumed >= rest_len {
                        if resolved && scratch.len() > rest_len {
                            overhang.extend_from_slice(&scratch[rest_len..]);
                        }
                        pos = agent.query.len();
                    } else {
                        pos += consumed;
                    }
                }
                None => return Ok(None),
            }
        }
        agent.set_key_from_query(agent.query.len());
        agent.key_buf.extend_from_slice(&overhang);
        let frame = PredictiveFrame {
            node,
            child_pos: layer.first_child_pos(node)?,
            key_len: agent.key_buf.len(),
            visited: false,
        };
        Ok(Some(vec![frame]))
    }

    /// Among the children of `node`, find the edge whose full label is the
    /// next run of `rest`; `consumed` is the label length.
    fn find_child(
        &self,
        node: u32,
        rest: &[u8],
        scratch: &mut Vec<u8>,
    ) -> Result<Option<(u32, usize)>> {
        let layer = &self.layers[0];
        let first = rest[0];
        let mut pos = layer.first_child_pos(node)?;
        while layer.louds_bit(pos) {
            let child = (pos - node as usize - 1) as u32;
            if layer.label_byte(child) == first {
                // Sibling first bytes are distinct, so this is the only
                // candidate; resolve and compare the full label.
                if !layer.has_link(child) {
                    return Ok(Some((child, 1)));
                }
                scratch.clear();
                self.append_label_forward(0, child, scratch)?;
                if scratch.len() <= rest.len() && rest[..scratch.len()] == scratch[..] {
                    return Ok(Some((child, scratch.len())));
                }
                return Ok(None);
            }
            pos += 1;
        }
        Ok(None)
    }

    /// Like `find_child`, but a label may also overrun the query if the
    /// query's remainder is a prefix of it. `resolved` reports whether
    /// `scratch` holds the full label.
    fn find_child_predictive(
        &self,
        node: u32,
        rest: &[u8],
        scratch: &mut Vec<u8>,
    ) -> Result<Option<(u32, usize, bool)>> {
        let layer = &self.layers[0];
        let first = rest[0];
        let mut pos = layer.first_child_pos(node)?;
        while layer.louds_bit(pos) {
            let child = (pos - node as usize - 1) as u32;
            if layer.label_byte(child) == first {
                if !layer.has_link(child) {
                    return Ok(Some((child, 1, false)));
                }
                scratch.clear();
                self.append_label_forward(0, child, scratch)?;
                let shared = scratch.len().min(rest.len());
                if scratch[..shared] == rest[..shared] {
                    return Ok(Some((child, shared, true)));
                }
                return Ok(None);
            }
            pos += 1;
        }
        Ok(None)
    }

    /// Append the forward label of the edge into `v` on layer `depth`
    pub(crate) fn append_label_forward(
        &self,
        depth: usize,
        v: u32,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let layer = &self.layers[depth];
        if !layer.has_link(v) {
            out.push(layer.label_byte(v));
            return Ok(());
        }
        let link = layer.link(v)? as usize;
        if depth + 1 < self.layers.len() {
            let node = self.layers[depth + 1].node_from_terminal(link)?;
            self.append_key_reversed(depth + 1, node, out)
        } else {
            let tail = layer
                .tail
                .as_ref()
                .ok_or_else(|| NestrieError::logic("link without tail on the last layer"))?;
            out.extend_from_slice(tail.get(link)?);
            Ok(())
        }
    }

    /// Append the reversed label of the edge into `v` on layer `depth`
    fn append_label_reversed(&self, depth: usize, v: u32, out: &mut Vec<u8>) -> Result<()> {
        let layer = &self.layers[depth];
        if !layer.has_link(v) {
            out.push(layer.label_byte(v));
            return Ok(());
        }
        let link = layer.link(v)? as usize;
        if depth + 1 < self.layers.len() {
            let node = self.layers[depth + 1].node_from_terminal(link)?;
            self.append_key_forward(depth + 1, node, out)
        } else {
            let tail = layer
                .tail
                .as_ref()
                .ok_or_else(|| NestrieError::logic("link without tail on the last layer"))?;
            let entry = tail.get(link)?;
            out.extend(entry.iter().rev());
            Ok(())
        }
    }

    /// Append the path spelled from the root of layer `depth` down to
    /// `node`, in forward order
    pub(crate) fn append_key_forward(
        &self,
        depth: usize,
        node: u32,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let layer = &self.layers[depth];
        let mut path = Vec::new();
        let mut v = node;
        while v != 0 {
            path.push(v);
            v = match layer.parent(v)? {
                Some(parent) => parent,
                None => break,
            };
        }
        for &u in path.iter().rev() {
            self.append_label_forward(depth, u, out)?;
        }
        Ok(())
    }

    /// Append the path spelled from `node` up to the root of layer
    /// `depth`, i.e. the forward spelling reversed
    fn append_key_reversed(&self, depth: usize, node: u32, out: &mut Vec<u8>) -> Result<()> {
        let layer = &self.layers[depth];
        let mut v = node;
        while v != 0 {
            self.append_label_reversed(depth, v, out)?;
            v = match layer.parent(v)? {
                Some(parent) => parent,
                None => break,
            };
        }
        Ok(())
    }
}
