//! Property-based tests
//!
//! Randomized keysets exercise the build/query/serialize pipeline:
//! whatever the input, ids and keys must stay in bijection and a
//! serialized trie must answer exactly like the original.

use std::collections::BTreeSet;

use proptest::prelude::*;

use nestrie::{Agent, Config, Keyset, NodeOrder, Trie};

fn arb_keys() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..48)
}

fn build_trie(keys: &[Vec<u8>], config: Config) -> (Trie<'static>, BTreeSet<Vec<u8>>) {
    let mut keyset = Keyset::new();
    let mut dedup = BTreeSet::new();
    for key in keys {
        keyset.push(key).unwrap();
        dedup.insert(key.clone());
    }
    (Trie::build(&mut keyset, config).unwrap(), dedup)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ids_form_a_bijection(keys in arb_keys()) {
        let (trie, dedup) = build_trie(&keys, Config::default());
        prop_assert_eq!(trie.num_keys(), dedup.len());

        let mut agent = Agent::new();
        let mut seen = BTreeSet::new();
        for key in &dedup {
            agent.set_query(key);
            prop_assert!(trie.lookup(&mut agent));
            let id = agent.key_id();
            prop_assert!((id as usize) < trie.num_keys());
            prop_assert!(seen.insert(id));

            agent.set_query_id(id);
            trie.reverse_lookup(&mut agent).unwrap();
            prop_assert_eq!(agent.key(), key.as_slice());
        }
    }

    #[test]
    fn prop_roundtrip_is_observationally_identical(keys in arb_keys()) {
        let (trie, dedup) = build_trie(&keys, Config::default());

        let mut out = nestrie::io::VecDataOutput::new();
        trie.write(&mut out).unwrap();
        let bytes = out.into_vec();
        prop_assert_eq!(bytes.len(), trie.io_size());

        let mapped = Trie::map(&bytes).unwrap();
        prop_assert_eq!(mapped.num_keys(), trie.num_keys());

        let mut agent = Agent::new();
        for key in &dedup {
            agent.set_query(key);
            prop_assert!(mapped.lookup(&mut agent));
            let mapped_id = agent.key_id();
            agent.set_query(key);
            prop_assert!(trie.lookup(&mut agent));
            prop_assert_eq!(mapped_id, agent.key_id());
        }

        // Identical input builds identical bytes.
        let (again, _) = build_trie(&keys, Config::default());
        let mut out2 = nestrie::io::VecDataOutput::new();
        again.write(&mut out2).unwrap();
        prop_assert_eq!(bytes, out2.into_vec());
    }

    #[test]
    fn prop_predictive_matches_filter(keys in arb_keys(), probe in prop::collection::vec(any::<u8>(), 0..4)) {
        let config = Config::builder().node_order(NodeOrder::Label).build().unwrap();
        let (trie, dedup) = build_trie(&keys, config);

        let expected: Vec<Vec<u8>> = dedup
            .iter()
            .filter(|k| k.starts_with(&probe))
            .cloned()
            .collect();

        let mut agent = Agent::new();
        agent.set_query(&probe);
        let mut got = Vec::new();
        while trie.predictive_search(&mut agent) {
            got.push(agent.key().to_vec());
        }
        // Label order enumerates lexicographically, matching BTreeSet order.
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_common_prefix_matches_filter(keys in arb_keys(), probe in prop::collection::vec(any::<u8>(), 0..8)) {
        let (trie, dedup) = build_trie(&keys, Config::default());

        let expected: BTreeSet<Vec<u8>> = dedup
            .iter()
            .filter(|k| probe.starts_with(k.as_slice()))
            .cloned()
            .collect();

        let mut agent = Agent::new();
        agent.set_query(&probe);
        let mut got = BTreeSet::new();
        while trie.common_prefix_search(&mut agent) {
            got.insert(agent.key().to_vec());
        }
        prop_assert_eq!(got, expected);
    }
}
