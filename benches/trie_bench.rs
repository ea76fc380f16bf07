//! Benchmarks for build and the four query kinds

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nestrie::{Agent, Config, Keyset, Trie};

fn synthetic_keys(count: usize) -> Vec<Vec<u8>> {
    // URL-ish keys: heavy shared prefixes and suffixes.
    let hosts = ["example", "wikipedia", "crates", "docs", "static"];
    let paths = ["index.html", "about", "search", "api/v1/items", "img/logo.png"];
    (0..count)
        .map(|i| {
            format!(
                "https://{}{}.org/{}/{}",
                hosts[i % hosts.len()],
                i / 25,
                paths[(i / 5) % paths.len()],
                i
            )
            .into_bytes()
        })
        .collect()
}

fn build_trie(keys: &[Vec<u8>]) -> Trie<'static> {
    let mut keyset = Keyset::new();
    for key in keys {
        keyset.push(key).unwrap();
    }
    Trie::build(&mut keyset, Config::default()).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    c.bench_function("build_10k", |b| {
        b.iter(|| {
            let mut keyset = Keyset::new();
            for key in &keys {
                keyset.push(key).unwrap();
            }
            black_box(Trie::build(&mut keyset, Config::default()).unwrap())
        })
    });
}

fn bench_lookup(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    let trie = build_trie(&keys);
    let mut agent = Agent::new();
    let mut i = 0;
    c.bench_function("lookup", |b| {
        b.iter(|| {
            agent.set_query(&keys[i % keys.len()]);
            i += 7;
            black_box(trie.lookup(&mut agent))
        })
    });
}

fn bench_reverse_lookup(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    let trie = build_trie(&keys);
    let mut agent = Agent::new();
    let mut id = 0u32;
    c.bench_function("reverse_lookup", |b| {
        b.iter(|| {
            agent.set_query_id(id % trie.num_keys() as u32);
            id = id.wrapping_add(13);
            trie.reverse_lookup(&mut agent).unwrap();
            black_box(agent.key().len())
        })
    });
}

fn bench_predictive(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    let trie = build_trie(&keys);
    let mut agent = Agent::new();
    c.bench_function("predictive_drain", |b| {
        b.iter(|| {
            agent.set_query(b"https://crates");
            let mut count = 0usize;
            while trie.predictive_search(&mut agent) {
                count += 1;
            }
            black_box(count)
        })
    });
}

criterion_group!(benches, bench_build, bench_lookup, bench_reverse_lookup, bench_predictive);
criterion_main!(benches);
