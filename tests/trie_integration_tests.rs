//! Integration tests for the trie container
//!
//! These tests validate the end-to-end contract: id assignment,
//! bijection between ids and keys, enumeration soundness and
//! completeness, serialization round-trips, mapped-vs-owned equivalence,
//! and configuration robustness across the whole flag space.

use std::collections::BTreeSet;

use nestrie::{
    Agent, CacheLevel, Config, Keyset, NestrieError, NodeOrder, TailMode, Trie,
};

// =============================================================================
// HELPERS
// =============================================================================

fn build(keys: &[&[u8]], config: Config) -> Trie<'static> {
    let mut keyset = Keyset::new();
    for key in keys {
        keyset.push(key).unwrap();
    }
    Trie::build(&mut keyset, config).unwrap()
}

fn fruit_corpus() -> Vec<&'static [u8]> {
    vec![
        b"a", b"app", b"apple", b"application", b"apply", b"apt", b"ban", b"banana",
    ]
}

fn lookup_id(trie: &Trie, key: &[u8]) -> Option<u32> {
    let mut agent = Agent::new();
    agent.set_query(key);
    if trie.lookup(&mut agent) {
        assert_eq!(agent.key(), key);
        Some(agent.key_id())
    } else {
        None
    }
}

fn collect_common_prefixes(trie: &Trie, query: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let mut agent = Agent::new();
    agent.set_query(query);
    let mut results = Vec::new();
    while trie.common_prefix_search(&mut agent) {
        results.push((agent.key_id(), agent.key().to_vec()));
    }
    // Exhausted streams stay exhausted.
    assert!(!trie.common_prefix_search(&mut agent));
    results
}

fn collect_predictive(trie: &Trie, query: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let mut agent = Agent::new();
    agent.set_query(query);
    let mut results = Vec::new();
    while trie.predictive_search(&mut agent) {
        results.push((agent.key_id(), agent.key().to_vec()));
    }
    assert!(!trie.predictive_search(&mut agent));
    results
}

fn reverse(trie: &Trie, id: u32) -> Vec<u8> {
    let mut agent = Agent::new();
    agent.set_query_id(id);
    trie.reverse_lookup(&mut agent).unwrap();
    assert_eq!(agent.key_id(), id);
    agent.key().to_vec()
}

/// Check the query contract against a naive model of the keyset.
fn check_against_model(trie: &Trie, keys: &[&[u8]]) {
    let dedup: BTreeSet<Vec<u8>> = keys.iter().map(|k| k.to_vec()).collect();
    assert_eq!(trie.num_keys(), dedup.len());

    // Every key looks up to a unique id in range; the id maps back.
    let mut seen = BTreeSet::new();
    for key in &dedup {
        let id = lookup_id(trie, key).unwrap_or_else(|| panic!("missing key {:?}", key));
        assert!((id as usize) < trie.num_keys());
        assert!(seen.insert(id), "duplicate id {}", id);
        assert_eq!(reverse(trie, id), *key);
    }

    // Unknown keys fail.
    assert_eq!(lookup_id(trie, b"\xFFnot-a-key\xFF"), None);

    // Common-prefix soundness and completeness on a few probes.
    for probe in keys.iter().take(4) {
        let expected: BTreeSet<Vec<u8>> = dedup
            .iter()
            .filter(|k| probe.starts_with(k))
            .cloned()
            .collect();
        let got: BTreeSet<Vec<u8>> =
            collect_common_prefixes(trie, probe).into_iter().map(|(_, k)| k).collect();
        assert_eq!(got, expected, "common prefixes of {:?}", probe);
    }

    // Predictive soundness and completeness on a few probes.
    for probe in [&b""[..], b"a", b"ap", b"zzz"] {
        let expected: BTreeSet<Vec<u8>> = dedup
            .iter()
            .filter(|k| k.starts_with(probe))
            .cloned()
            .collect();
        let results = collect_predictive(trie, probe);
        let got: BTreeSet<Vec<u8>> = results.iter().map(|(_, k)| k.clone()).collect();
        assert_eq!(got, expected, "predictive of {:?}", probe);
        for (id, key) in &results {
            assert_eq!(reverse(trie, *id), *key);
        }
    }
}

// =============================================================================
// CONCRETE SCENARIOS
// =============================================================================

#[test]
fn test_empty_keyset() {
    let mut keyset = Keyset::new();
    let trie = Trie::build(&mut keyset, Config::default()).unwrap();
    assert_eq!(trie.num_keys(), 0);
    assert!(trie.is_empty());

    assert_eq!(lookup_id(&trie, b""), None);
    assert_eq!(lookup_id(&trie, b"anything"), None);
    assert!(collect_predictive(&trie, b"").is_empty());
    assert!(collect_common_prefixes(&trie, b"abc").is_empty());

    let mut agent = Agent::new();
    agent.set_query_id(0);
    assert!(matches!(
        trie.reverse_lookup(&mut agent),
        Err(NestrieError::Bounds { .. })
    ));

    // An empty trie still round-trips.
    let mut out = nestrie::io::VecDataOutput::new();
    trie.write(&mut out).unwrap();
    let reread = Trie::map(out.as_slice()).unwrap();
    assert_eq!(reread.num_keys(), 0);
}

#[test]
fn test_fruit_corpus_queries() {
    let keys = fruit_corpus();
    let trie = build(&keys, Config::default());
    assert_eq!(trie.num_keys(), 8);

    let prefixes: BTreeSet<Vec<u8>> = collect_common_prefixes(&trie, b"apple")
        .into_iter()
        .map(|(_, k)| k)
        .collect();
    let expected: BTreeSet<Vec<u8>> =
        [&b"a"[..], b"app", b"apple"].iter().map(|k| k.to_vec()).collect();
    assert_eq!(prefixes, expected);

    let completions: BTreeSet<Vec<u8>> = collect_predictive(&trie, b"app")
        .into_iter()
        .map(|(_, k)| k)
        .collect();
    let expected: BTreeSet<Vec<u8>> = [&b"app"[..], b"apple", b"application", b"apply"]
        .iter()
        .map(|k| k.to_vec())
        .collect();
    assert_eq!(completions, expected);

    let banana_id = lookup_id(&trie, b"banana").unwrap();
    assert_eq!(reverse(&trie, banana_id), b"banana");

    check_against_model(&trie, &keys);
}

#[test]
fn test_empty_key_among_keys() {
    let trie = build(&[b"", b"a"], Config::default());
    assert_eq!(trie.num_keys(), 2);

    let empty_id = lookup_id(&trie, b"").unwrap();
    let a_id = lookup_id(&trie, b"a").unwrap();
    assert_ne!(empty_id, a_id);
    assert_eq!(reverse(&trie, empty_id), b"");

    // The empty key is a prefix of every query.
    let results = collect_common_prefixes(&trie, b"a");
    assert_eq!(
        results.iter().map(|(_, k)| k.clone()).collect::<Vec<_>>(),
        vec![b"".to_vec(), b"a".to_vec()]
    );

    // And predictive from the empty query enumerates everything.
    assert_eq!(collect_predictive(&trie, b"").len(), 2);
}

#[test]
fn test_duplicate_keys_coalesce() {
    let mut keyset = Keyset::new();
    keyset.push_weighted(b"dup", 1.0).unwrap();
    keyset.push_weighted(b"dup", 2.0).unwrap();
    keyset.push(b"other").unwrap();
    let trie = Trie::build(&mut keyset, Config::default()).unwrap();
    assert_eq!(trie.num_keys(), 2);
    // Both duplicate entries got the same id.
    assert_eq!(keyset.key_id(0), keyset.key_id(1));
    assert_ne!(keyset.key_id(0), keyset.key_id(2));
}

#[test]
fn test_keyset_ids_match_lookup() {
    let mut keyset = Keyset::new();
    for key in fruit_corpus() {
        keyset.push(key).unwrap();
    }
    let trie = Trie::build(&mut keyset, Config::default()).unwrap();
    for i in 0..keyset.len() {
        let id = keyset.key_id(i).unwrap();
        assert_eq!(lookup_id(&trie, keyset.key(i)), Some(id));
    }
}

#[test]
fn test_text_tail_rejects_nul_keys() {
    let mut keyset = Keyset::new();
    keyset.push(b"ok").unwrap();
    keyset.push(b"bad\x00key").unwrap();
    let config = Config::builder().tail_mode(TailMode::Text).build().unwrap();
    let err = Trie::build(&mut keyset, config).unwrap_err();
    assert!(matches!(err, NestrieError::InvalidArgument { .. }));

    // Binary tails accept the same keyset.
    let trie = build(&[b"ok", b"bad\x00key", b"\x00\x00"], Config::default());
    assert_eq!(trie.num_keys(), 3);
    assert!(lookup_id(&trie, b"bad\x00key").is_some());
    assert!(lookup_id(&trie, b"\x00\x00").is_some());
}

#[test]
fn test_invalid_num_tries_rejected() {
    assert!(matches!(
        Config::builder().num_tries(0).build(),
        Err(NestrieError::InvalidArgument { .. })
    ));
    assert!(matches!(
        Config::builder().num_tries(8).build(),
        Err(NestrieError::InvalidArgument { .. })
    ));
    assert!(matches!(
        Config::from_flags(0x0004_0000),
        Err(NestrieError::InvalidArgument { .. })
    ));
}

// =============================================================================
// RANDOMIZED BIJECTION (deterministic generator)
// =============================================================================

struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[test]
fn test_large_random_keyset_bijection() {
    let mut rng = SplitMix64(0x5EED);
    let mut keyset = Keyset::new();
    let mut dedup = BTreeSet::new();
    for _ in 0..100_000 {
        let len = 1 + (rng.next() % 32) as usize;
        let key: Vec<u8> = (0..len).map(|_| (rng.next() % 8 + b'a' as u64) as u8).collect();
        keyset.push(&key).unwrap();
        dedup.insert(key);
    }
    let trie = Trie::build(&mut keyset, Config::default()).unwrap();
    assert_eq!(trie.num_keys(), dedup.len());

    let mut agent = Agent::new();
    for key in &dedup {
        agent.set_query(key);
        assert!(trie.lookup(&mut agent), "missing {:?}", key);
        let id = agent.key_id();
        agent.set_query_id(id);
        trie.reverse_lookup(&mut agent).unwrap();
        assert_eq!(agent.key(), key.as_slice());

        // lookup(reverse_lookup(id)) == id
        let restored = agent.key().to_vec();
        agent.set_query(&restored);
        assert!(trie.lookup(&mut agent));
        assert_eq!(agent.key_id(), id);
    }
}

// =============================================================================
// ORDERING GUARANTEES
// =============================================================================

#[test]
fn test_label_order_predictive_is_lexicographic() {
    let keys = fruit_corpus();
    let config = Config::builder().node_order(NodeOrder::Label).build().unwrap();
    let trie = build(&keys, config);
    for probe in [&b""[..], b"a", b"app"] {
        let results: Vec<Vec<u8>> =
            collect_predictive(&trie, probe).into_iter().map(|(_, k)| k).collect();
        let mut sorted = results.clone();
        sorted.sort();
        assert_eq!(results, sorted, "probe {:?}", probe);
    }
}

#[test]
fn test_weight_order_streams_heavy_first() {
    let mut keyset = Keyset::new();
    keyset.push_weighted(b"rare", 1.0).unwrap();
    keyset.push_weighted(b"common", 100.0).unwrap();
    keyset.push_weighted(b"medium", 10.0).unwrap();
    let trie = Trie::build(&mut keyset, Config::default()).unwrap();

    let results: Vec<Vec<u8>> =
        collect_predictive(&trie, b"").into_iter().map(|(_, k)| k).collect();
    assert_eq!(results, vec![b"common".to_vec(), b"medium".to_vec(), b"rare".to_vec()]);
}

#[test]
fn test_weight_order_breaks_ties_lexicographically() {
    let trie = build(&[b"delta", b"alpha", b"echo"], Config::default());
    let results: Vec<Vec<u8>> =
        collect_predictive(&trie, b"").into_iter().map(|(_, k)| k).collect();
    assert_eq!(results, vec![b"alpha".to_vec(), b"delta".to_vec(), b"echo".to_vec()]);
}

// =============================================================================
// SERIALIZATION, MAPPING, FILES
// =============================================================================

#[test]
fn test_roundtrip_answers_identically() {
    let keys = fruit_corpus();
    let trie = build(&keys, Config::default());

    let mut out = nestrie::io::VecDataOutput::new();
    trie.write(&mut out).unwrap();
    let bytes = out.into_vec();

    let mut input = nestrie::io::SliceDataInput::new(&bytes);
    let reread = Trie::read(&mut input).unwrap();
    let mapped = Trie::map(&bytes).unwrap();

    for probe in keys.iter() {
        assert_eq!(lookup_id(&reread, probe), lookup_id(&trie, probe));
        assert_eq!(lookup_id(&mapped, probe), lookup_id(&trie, probe));
        assert_eq!(
            collect_predictive(&mapped, probe),
            collect_predictive(&trie, probe)
        );
        assert_eq!(
            collect_common_prefixes(&mapped, probe),
            collect_common_prefixes(&trie, probe)
        );
    }
    check_against_model(&reread, &keys);
    check_against_model(&mapped, &keys);
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fruit.nestrie");

    let keys = fruit_corpus();
    let trie = build(&keys, Config::default());
    trie.save(&path).unwrap();

    let loaded = Trie::load(&path).unwrap();
    assert_eq!(loaded.num_keys(), trie.num_keys());
    assert_eq!(loaded.io_size(), trie.io_size());
    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, trie.io_size());
    check_against_model(&loaded, &keys);
}

#[cfg(feature = "mmap")]
#[test]
fn test_memory_mapped_open() {
    use nestrie::io::MemoryMappedInput;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapped.nestrie");

    let keys = fruit_corpus();
    let trie = build(&keys, Config::default());
    trie.save(&path).unwrap();

    let mapping = MemoryMappedInput::from_path(&path).unwrap();
    let mapped = Trie::map(mapping.as_bytes()).unwrap();
    assert_eq!(mapped.num_keys(), trie.num_keys());
    // Mapped payload is borrowed, so the in-memory footprint is tiny.
    assert!(mapped.total_size() < trie.total_size());
    check_against_model(&mapped, &keys);
}

// =============================================================================
// CONFIGURATION SWEEP
// =============================================================================

#[test]
fn test_all_config_combinations() {
    let keys: Vec<&[u8]> = vec![
        b"", b"a", b"ab", b"abc", b"abcdefghij", b"abx", b"b", b"banana", b"bandana",
        b"cat", b"catalog", b"catalogue", b"dog", b"zzzzzzzzzzzzzzzz",
    ];
    let reference = build(&keys, Config::default());
    let reference_ids: Vec<Option<u32>> =
        keys.iter().map(|k| lookup_id(&reference, k)).collect();

    for num_tries in 1..=7 {
        for cache_level in [
            CacheLevel::Tiny,
            CacheLevel::Small,
            CacheLevel::Normal,
            CacheLevel::Large,
            CacheLevel::Huge,
        ] {
            for tail_mode in [TailMode::Text, TailMode::Binary] {
                for node_order in [NodeOrder::Label, NodeOrder::Weight] {
                    let config = Config::builder()
                        .num_tries(num_tries)
                        .cache_level(cache_level)
                        .tail_mode(tail_mode)
                        .node_order(node_order)
                        .build()
                        .unwrap();
                    let trie = build(&keys, config);
                    check_against_model(&trie, &keys);
                    assert!(trie.num_tries() <= num_tries as usize);

                    // Key ids depend only on the first layer, which is
                    // identical for every nesting depth and tail mode.
                    if node_order == NodeOrder::Weight {
                        let ids: Vec<Option<u32>> =
                            keys.iter().map(|k| lookup_id(&trie, k)).collect();
                        assert_eq!(ids, reference_ids);
                    }

                    // Round-trip under this exact configuration.
                    let mut out = nestrie::io::VecDataOutput::new();
                    trie.write(&mut out).unwrap();
                    let mapped = Trie::map(out.as_slice()).unwrap();
                    check_against_model(&mapped, &keys);
                }
            }
        }
    }
}

// =============================================================================
// CONCURRENT READERS
// =============================================================================

#[test]
fn test_shared_trie_across_threads() {
    use std::sync::Arc;

    let keys = fruit_corpus();
    let trie = Arc::new(build(&keys, Config::default()));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let trie = Arc::clone(&trie);
            std::thread::spawn(move || {
                let mut agent = Agent::new();
                for _ in 0..500 {
                    let key: &[u8] = [&b"apple"[..], b"banana", b"apt", b"nope"][t % 4];
                    agent.set_query(key);
                    let found = trie.lookup(&mut agent);
                    assert_eq!(found, key != b"nope");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
