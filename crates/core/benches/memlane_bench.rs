//! Benchmarks for the Memlane engine

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use memlane_core::{Cache, Engine, EngineConfig, Program, epoch_seed_hash};

const BENCH_ITEMS: usize = 1 << 16;

fn bench_engine(full_dataset: bool) -> Engine {
    let config = EngineConfig::default()
        .with_dataset_items(BENCH_ITEMS)
        .with_full_dataset(full_dataset);
    let engine = Engine::new(config).unwrap();
    engine.set_main_seed_hash(&epoch_seed_hash(0));
    engine
}

fn bench_hash(c: &mut Criterion) {
    let engine = bench_engine(true);
    let seed = epoch_seed_hash(0);
    let header = b"benchmark header for memlane performance";

    c.bench_function("memlane_hash", |b| {
        b.iter(|| engine.compute_hash(&seed, black_box(header), black_box(100)))
    });
}

fn bench_hash_varying_nonce(c: &mut Criterion) {
    let engine = bench_engine(true);
    let seed = epoch_seed_hash(0);

    c.bench_function("memlane_hash_varying", |b| {
        let mut nonce: u64 = 0;
        b.iter(|| {
            let mut header = [0u8; 40];
            header[32..].copy_from_slice(&nonce.to_le_bytes());
            nonce = nonce.wrapping_add(1);
            engine.compute_hash(&seed, black_box(&header), 100)
        })
    });
}

fn bench_hash_light(c: &mut Criterion) {
    let engine = bench_engine(false);
    let seed = epoch_seed_hash(0);

    c.bench_function("memlane_hash_light", |b| {
        b.iter(|| engine.compute_hash(&seed, black_box(b"light"), 100))
    });
}

fn bench_cache_build(c: &mut Criterion) {
    let seed = epoch_seed_hash(1);
    c.bench_function("memlane_cache_build", |b| {
        b.iter_batched(
            || Cache::allocate(EngineConfig::default().cache_size).unwrap(),
            |mut cache| cache.rebuild(black_box(&seed)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_program_derive(c: &mut Criterion) {
    c.bench_function("memlane_program_derive", |b| {
        b.iter(|| Program::derive(black_box(12_345)))
    });
}

criterion_group!(
    benches,
    bench_hash,
    bench_hash_varying_nonce,
    bench_hash_light,
    bench_cache_build,
    bench_program_derive
);
criterion_main!(benches);
