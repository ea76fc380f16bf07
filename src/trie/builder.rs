//! Keyset-to-forest construction
//!
//! Each layer is built breadth-first over a queue of sorted key ranges.
//! A range covers the keys below one node; its sub-ranges become child
//! edges, and an edge label is extended greedily while every key in the
//! sub-range shares the next byte and no key terminates inside the
//! extension. Single-byte labels stay inline; longer labels become link
//! nodes whose reversed text is fed to the next layer as its keyset, or
//! to the tail store once the configured depth runs out.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::config::{CacheLevel, Config, NodeOrder, TailMode};
use crate::error::{NestrieError, Result};
use crate::keyset::Keyset;
use crate::succinct::storage::ByteBuf;
use crate::succinct::{BitVector, IntVector};
use crate::trie::louds::LoudsLayer;
use crate::trie::tail::TailStore;

pub(crate) struct BuildOutput {
    pub layers: Vec<LoudsLayer<'static>>,
    pub num_keys: usize,
}

/// One deduplicated key (or reversed label) with its accumulated weight
struct Entry {
    bytes: Vec<u8>,
    weight: f32,
}

/// A collapsed multi-byte label waiting for its link value
struct PendingLink {
    label: Vec<u8>,
    weight: f32,
}

/// Keys `[begin, end)` share a spelled prefix of `depth` bytes
struct KeyRange {
    begin: usize,
    end: usize,
    depth: usize,
}

/// A sub-range of siblings sharing the first byte `byte`, with the
/// maximal shared extension `len`
struct ChildGroup {
    begin: usize,
    end: usize,
    len: usize,
    weight: f32,
    byte: u8,
}

struct LayerParts {
    louds: BitVector<'static>,
    labels: Vec<u8>,
    link_flags: BitVector<'static>,
    terminal_flags: BitVector<'static>,
    /// Terminal node of each input entry
    term_node: Vec<u32>,
    pending: Vec<PendingLink>,
}

struct StagedLayer {
    parts: LayerParts,
    /// Resolved link values in pending order; filled once the next layer
    /// (or the tail) has assigned them
    link_values: Option<Vec<u64>>,
    /// Next-layer entry index of each pending label
    pending_entry: Vec<usize>,
    tail: Option<TailStore<'static>>,
}

pub(crate) fn build(keyset: &mut Keyset, config: Config) -> Result<BuildOutput> {
    keyset.clear_key_ids();
    if config.tail_mode() == TailMode::Text {
        for i in 0..keyset.len() {
            if keyset.key(i).contains(&0) {
                return Err(NestrieError::invalid_argument(
                    "text tail mode cannot index keys containing NUL",
                ));
            }
        }
    }

    // Sort and coalesce the keyset; remember where each input entry went.
    let mut order: Vec<usize> = (0..keyset.len()).collect();
    order.sort_by(|&a, &b| keyset.key(a).cmp(keyset.key(b)));
    let mut entries: Vec<Entry> = Vec::new();
    let mut keyset_entry = vec![0usize; keyset.len()];
    for &ks in &order {
        let is_duplicate =
            entries.last().is_some_and(|last| last.bytes.as_slice() == keyset.key(ks));
        if is_duplicate {
            if let Some(last) = entries.last_mut() {
                last.weight += keyset.weight(ks);
            }
        } else {
            entries.push(Entry { bytes: keyset.key(ks).to_vec(), weight: keyset.weight(ks) });
        }
        keyset_entry[ks] = entries.len() - 1;
    }
    if entries.len() > u32::MAX as usize {
        return Err(NestrieError::range("key count exceeds 2^32"));
    }
    let num_keys = entries.len();

    let level = config.cache_level();
    let num_tries = config.num_tries();
    let mut staged: Vec<StagedLayer> = Vec::new();
    let mut first_layer_ids: Vec<u32> = Vec::new();
    let mut current = entries;

    for depth in 0..num_tries {
        let parts = build_layer(&current, config.node_order(), level)?;
        let ids: Vec<u32> = parts
            .term_node
            .iter()
            .map(|&n| parts.terminal_flags.rank1(n as usize) as u32)
            .collect();
        log::debug!(
            "layer {}: {} nodes, {} terminals, {} pending labels",
            depth,
            parts.labels.len(),
            ids.len(),
            parts.pending.len()
        );

        if depth == 0 {
            first_layer_ids = ids;
        } else {
            let prev = staged
                .last_mut()
                .ok_or_else(|| NestrieError::logic("layer staging out of order"))?;
            let values = prev.pending_entry.iter().map(|&e| ids[e] as u64).collect();
            prev.link_values = Some(values);
        }

        let is_last = depth + 1 == num_tries || parts.pending.is_empty();
        if is_last {
            // Remaining multi-byte labels go to this layer's tail store.
            let mut tail = TailStore::new(config.tail_mode());
            let mut offsets: HashMap<Vec<u8>, u64> = HashMap::new();
            let mut values = Vec::with_capacity(parts.pending.len());
            for link in &parts.pending {
                let offset = match offsets.get(&link.label) {
                    Some(&o) => o,
                    None => {
                        let o = tail.append(&link.label)?;
                        offsets.insert(link.label.clone(), o);
                        o
                    }
                };
                values.push(offset);
            }
            staged.push(StagedLayer {
                parts,
                link_values: Some(values),
                pending_entry: Vec::new(),
                tail: Some(tail),
            });
            break;
        }

        // Reversed labels become the next layer's keyset; common suffixes
        // of the originals turn into shared prefixes there.
        let mut merged: BTreeMap<Vec<u8>, f32> = BTreeMap::new();
        for link in &parts.pending {
            let reversed: Vec<u8> = link.label.iter().rev().copied().collect();
            *merged.entry(reversed).or_insert(0.0) += link.weight;
        }
        let next: Vec<Entry> = merged
            .into_iter()
            .map(|(bytes, weight)| Entry { bytes, weight })
            .collect();
        let pending_entry = parts
            .pending
            .iter()
            .map(|link| {
                let reversed: Vec<u8> = link.label.iter().rev().copied().collect();
                next.binary_search_by(|e| e.bytes.as_slice().cmp(reversed.as_slice()))
                    .map_err(|_| NestrieError::logic("pending label missing from next layer"))
            })
            .collect::<Result<Vec<usize>>>()?;
        staged.push(StagedLayer { parts, link_values: None, pending_entry, tail: None });
        current = next;
    }

    for ks in 0..keyset.len() {
        keyset.set_key_id(ks, first_layer_ids[keyset_entry[ks]]);
    }

    let mut layers = Vec::with_capacity(staged.len());
    for stage in staged {
        let values = stage
            .link_values
            .ok_or_else(|| NestrieError::logic("unresolved link values"))?;
        let layer = LoudsLayer {
            louds: stage.parts.louds,
            terminal_flags: stage.parts.terminal_flags,
            labels: ByteBuf::from(stage.parts.labels),
            link_flags: stage.parts.link_flags,
            links: IntVector::build_from(&values)?,
            tail: stage.tail,
        };
        layer.validate()?;
        layers.push(layer);
    }
    Ok(BuildOutput { layers, num_keys })
}

/// Build one LOUDS layer over sorted, deduplicated entries
fn build_layer(entries: &[Entry], order: NodeOrder, level: CacheLevel) -> Result<LayerParts> {
    let mut louds = BitVector::new();
    louds.push(true)?; // super root
    louds.push(false)?;
    let mut labels: Vec<u8> = vec![0];
    let mut link_flags = BitVector::new();
    link_flags.push(false)?;
    let mut terminal_flags = BitVector::new();
    let mut term_node = vec![0u32; entries.len()];
    let mut pending: Vec<PendingLink> = Vec::new();

    let mut queue: VecDeque<KeyRange> = VecDeque::new();
    queue.push_back(KeyRange { begin: 0, end: entries.len(), depth: 0 });
    let mut node: u32 = 0;

    while let Some(range) = queue.pop_front() {
        let mut begin = range.begin;
        let terminal_here = begin < range.end && entries[begin].bytes.len() == range.depth;
        terminal_flags.push(terminal_here)?;
        if terminal_here {
            term_node[begin] = node;
            begin += 1;
        }

        let mut groups: Vec<ChildGroup> = Vec::new();
        let mut g = begin;
        while g < range.end {
            let byte = entries[g].bytes[range.depth];
            let mut h = g + 1;
            while h < range.end && entries[h].bytes[range.depth] == byte {
                h += 1;
            }
            // Extend while the whole group shares the next byte. A key
            // ending inside the extension would be the group's smallest,
            // so checking the first key's length suffices.
            let mut len = 1;
            loop {
                let p = range.depth + len;
                if entries[g].bytes.len() <= p {
                    break;
                }
                if entries[g].bytes[p] != entries[h - 1].bytes[p] {
                    break;
                }
                len += 1;
            }
            let weight = entries[g..h].iter().map(|e| e.weight).sum();
            groups.push(ChildGroup { begin: g, end: h, len, weight, byte });
            g = h;
        }

        if order == NodeOrder::Weight {
            groups.sort_by(|a, b| {
                b.weight
                    .partial_cmp(&a.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.byte.cmp(&b.byte))
            });
        }

        for group in &groups {
            if labels.len() >= u32::MAX as usize {
                return Err(NestrieError::range("node count exceeds 2^32"));
            }
            louds.push(true)?;
            labels.push(group.byte);
            if group.len == 1 {
                link_flags.push(false)?;
            } else {
                link_flags.push(true)?;
                pending.push(PendingLink {
                    label: entries[group.begin].bytes[range.depth..range.depth + group.len].to_vec(),
                    weight: group.weight,
                });
            }
            queue.push_back(KeyRange {
                begin: group.begin,
                end: group.end,
                depth: range.depth + group.len,
            });
        }
        louds.push(false)?;
        node += 1;
    }

    louds.build_index(level, true, true)?;
    terminal_flags.build_index(level, false, true)?;
    link_flags.build_index(level, false, false)?;

    Ok(LayerParts { louds, labels, link_flags, terminal_flags, term_node, pending })
}
