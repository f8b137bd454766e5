use cachefu_storage::{CacheConfig, MemoryTier, TwoTierCache};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

const KEYS: u64 = 1_000;

fn bench_memory_tier(c: &mut Criterion) {
    let tier: MemoryTier<u64, u64> = MemoryTier::new(KEYS as usize, KEYS as usize, Duration::from_secs(600));
    for k in 0..KEYS {
        tier.put(k, k);
    }

    c.bench_function("memory/get_hit", |b| {
        let mut k = 0;
        b.iter(|| {
            k = (k + 1) % KEYS;
            black_box(tier.get(black_box(&k)));
        });
    });

    c.bench_function("memory/put_evicting", |b| {
        let mut k = KEYS;
        b.iter(|| {
            k += 1;
            black_box(tier.put(black_box(k), k));
        });
    });
}

fn bench_engine(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let mut cache: TwoTierCache<String, String> =
        TwoTierCache::with_json(CacheConfig::new("BenchCache").with_max_entries(KEYS as usize))
            .expect("valid config");
    assert!(cache.enable_disk_cache_at(temp_dir.path()));

    let keys: Vec<String> = (0..KEYS).map(|k| format!("key-{k}")).collect();
    for key in &keys {
        cache.put(key.clone(), format!("value for {key}"));
    }

    c.bench_function("engine/get_memory_hit", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(cache.get(black_box(&keys[i])));
        });
    });

    c.bench_function("engine/get_disk_hit", |b| {
        b.iter_batched(
            || cache.clear(),
            |()| black_box(cache.get(black_box(&keys[0]))),
            BatchSize::PerIteration,
        );
    });

    c.bench_function("engine/put_write_through", |b| {
        b.iter(|| {
            cache.put(black_box(keys[1].clone()), black_box("updated".to_string()));
        });
    });
}

criterion_group!(benches, bench_memory_tier, bench_engine);
criterion_main!(benches);
