//! Tests for the Memlane engine

use std::sync::Arc;
use std::thread;

use crate::epoch::EpochManager;
use crate::{
    Engine, EngineConfig, Error, HASH_SIZE, ITEM_SIZE, MinerThreadTag, PERIOD_LENGTH, SeedHash, Worker,
    check_difficulty, epoch_seed_hash,
};

fn small_config() -> EngineConfig {
    EngineConfig::default()
        .with_cache_size(1024)
        .with_dataset_items(4096)
        .with_init_threads(2)
        .with_large_pages(false)
}

fn engine() -> Engine {
    Engine::new(small_config()).unwrap()
}

fn diff_bits(a: &[u8; HASH_SIZE], b: &[u8; HASH_SIZE]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[test]
fn test_basic_hash() {
    let engine = engine();
    let seed = epoch_seed_hash(0);

    let result = engine.compute_hash(&seed, b"test header", 1);
    assert_eq!(result.len(), 32);

    // Deterministic, including across engines
    assert_eq!(result, engine.compute_hash(&seed, b"test header", 1));
    assert_eq!(result, self::engine().compute_hash(&seed, b"test header", 1));
}

#[test]
fn test_different_headers_produce_different_hashes() {
    let engine = engine();
    let seed = epoch_seed_hash(0);

    assert_ne!(
        engine.compute_hash(&seed, b"header 1", 0),
        engine.compute_hash(&seed, b"header 2", 0)
    );
}

#[test]
fn test_avalanche_effect() {
    let engine = engine();
    let seed = epoch_seed_hash(0);

    let header = *b"avalanche header bytes 0123456789";
    let reference = engine.compute_hash(&seed, &header, 100);

    // Flip every bit of the header in turn
    let mut total = 0u32;
    for bit in 0..header.len() * 8 {
        let mut flipped = header;
        flipped[bit / 8] ^= 1 << (bit % 8);
        let bits = diff_bits(&reference, &engine.compute_hash(&seed, &flipped, 100));

        assert!(
            (80..=176).contains(&bits),
            "Avalanche effect: {} bits differ flipping bit {}",
            bits,
            bit
        );
        total += bits;
    }

    // Expect roughly 128 bits (50% of 256) to differ on average
    let mean = total as f64 / (header.len() * 8) as f64;
    assert!((120.0..=136.0).contains(&mean), "Avalanche effect: mean {:.2} bits (expected ~128)", mean);
}

#[test]
fn test_epoch_isolation() {
    let engine = engine();

    let a = engine.compute_hash(&epoch_seed_hash(0), b"header", 10);
    let b = engine.compute_hash(&epoch_seed_hash(1), b"header", 10);
    assert_ne!(a, b);
}

#[test]
fn test_period_isolation() {
    let engine = engine();
    let seed = epoch_seed_hash(0);

    let first = engine.compute_hash(&seed, b"header", 0);
    // Same period, same program
    assert_eq!(first, engine.compute_hash(&seed, b"header", PERIOD_LENGTH - 1));
    // Next period
    assert_ne!(first, engine.compute_hash(&seed, b"header", PERIOD_LENGTH));
}

#[test]
fn test_light_mode_matches_full() {
    let full = engine();
    let light = Engine::new(small_config().with_full_dataset(false)).unwrap();
    assert!(!full.is_light());
    assert!(light.is_light());

    let seed = epoch_seed_hash(4);
    for height in [0u64, 5, 7_499] {
        assert_eq!(
            full.compute_hash(&seed, b"verify me", height),
            light.compute_hash(&seed, b"verify me", height)
        );
    }
}

#[test]
fn test_dataset_allocation_failure_hashes_like_full() {
    let config = small_config();
    let epochs = EpochManager::with_dataset_allocator(&config, |items, _| {
        Err(Error::OutOfMemory {
            what: "dataset",
            bytes: items as usize * ITEM_SIZE,
        })
    })
    .unwrap();
    let fallback = Engine::with_epochs(config.clone(), epochs);
    let full = engine();

    assert!(fallback.is_light());
    assert!(fallback.config().full_dataset);
    assert!(!full.is_light());

    let seed = epoch_seed_hash(2);
    for height in [0u64, 3, 7_499] {
        assert_eq!(
            fallback.compute_hash(&seed, b"fallback header", height),
            full.compute_hash(&seed, b"fallback header", height)
        );
    }
}

#[test]
fn test_init_thread_count_does_not_matter() {
    let one = Engine::new(small_config().with_init_threads(1)).unwrap();
    let four = Engine::new(small_config().with_init_threads(4)).unwrap();
    let seed = epoch_seed_hash(9);

    assert_eq!(
        one.compute_hash(&seed, b"header", 42),
        four.compute_hash(&seed, b"header", 42)
    );
}

#[test]
fn test_stale_seed_rebuilds_synchronously() {
    let engine = engine();
    let old = epoch_seed_hash(0);
    let new = epoch_seed_hash(1);

    engine.set_main_seed_hash(&old);
    assert_eq!(engine.main_seed_hash(), Some(old));

    let hash = engine.compute_hash(&new, b"header", 7_500);
    assert_eq!(engine.main_seed_hash(), Some(new));
    assert_eq!(hash, self::engine().compute_hash(&new, b"header", 7_500));

    // And back again
    let again = engine.compute_hash(&old, b"header", 0);
    assert_eq!(again, self::engine().compute_hash(&old, b"header", 0));
}

#[test]
fn test_set_main_seed_hash_is_idempotent() {
    let engine = engine();
    let seed = epoch_seed_hash(2);

    engine.set_main_seed_hash(&seed);
    let before = engine.compute_hash(&seed, b"header", 0);
    engine.set_main_seed_hash(&seed);
    engine.ensure_ready(&seed);

    assert_eq!(engine.main_seed_hash(), Some(seed));
    assert_eq!(before, engine.compute_hash(&seed, b"header", 0));
}

#[test]
fn test_header_edge_cases() {
    let engine = engine();
    let seed = epoch_seed_hash(0);

    // Empty header is valid
    let empty = engine.compute_hash(&seed, b"", 0);
    assert_ne!(empty, [0u8; 32]);

    // Trailing zero bytes pad to the same words
    assert_eq!(empty, engine.compute_hash(&seed, &[0u8; 3], 0));

    // Only the first 72 bytes are absorbed
    let long: Vec<u8> = (0..100u8).collect();
    assert_eq!(
        engine.compute_hash(&seed, &long[..72], 0),
        engine.compute_hash(&seed, &long, 0)
    );
    assert_ne!(
        engine.compute_hash(&seed, &long[..71], 0),
        engine.compute_hash(&seed, &long, 0)
    );
}

#[test]
fn test_concurrent_hashing_matches_sequential() {
    let engine = Arc::new(engine());
    let seed = epoch_seed_hash(5);
    engine.set_main_seed_hash(&seed);

    let headers: Vec<Vec<u8>> = (0..32u32).map(|i| i.to_le_bytes().repeat(5)).collect();
    let expected: Vec<[u8; 32]> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| engine.compute_hash(&seed, h, i as u64))
        .collect();

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let headers = headers.clone();
            thread::spawn(move || {
                let mut worker = Worker::new(engine, MinerThreadTag(t));
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| worker.compute_hash(&seed, h, i as u64).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_concurrent_seed_changes_never_expose_partial_state() {
    let seeds = [epoch_seed_hash(10), epoch_seed_hash(11)];

    let reference = engine();
    let expected: Vec<[u8; 32]> = seeds
        .iter()
        .map(|s| reference.compute_hash(s, b"header", 0))
        .collect();

    let engine = Arc::new(engine());
    let handles: Vec<_> = (0..4usize)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let expected = expected.clone();
            thread::spawn(move || {
                for i in 0..12 {
                    let which = (i + t) % 2;
                    if i % 3 == 0 {
                        engine.set_main_seed_hash(&seeds[which]);
                    }
                    assert_eq!(engine.compute_hash(&seeds[which], b"header", 0), expected[which]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_check_difficulty_on_hashes() {
    let engine = engine();
    let seed = epoch_seed_hash(0);

    let hash = engine.compute_hash(&seed, b"header", 0);
    assert!(check_difficulty(&hash, 1));

    // A hash with a set top bit fails difficulty 2
    let found = (0u32..64)
        .map(|n| engine.compute_hash(&seed, &n.to_le_bytes(), 0))
        .find(|h| h[31] & 0x80 != 0)
        .unwrap();
    assert!(!check_difficulty(&found, 2));
}

#[test]
fn test_ffi_round_trip() {
    use crate::ffi::*;

    let engine = memlane_engine_new(1024, 4096, 2, true);
    assert!(!engine.is_null());

    let seed = epoch_seed_hash(0);
    memlane_set_main_seed_hash(engine, seed.as_bytes().as_ptr());

    let header = b"ffi header";
    let mut out = [0u8; 32];
    assert!(memlane_hash(
        engine,
        seed.as_bytes().as_ptr(),
        header.as_ptr(),
        header.len(),
        3,
        out.as_mut_ptr()
    ));
    assert_eq!(out, self::engine().compute_hash(&seed, header, 3));

    assert!(!memlane_hash(
        engine,
        core::ptr::null(),
        header.as_ptr(),
        header.len(),
        3,
        out.as_mut_ptr()
    ));

    memlane_engine_free(engine);
    memlane_engine_free(core::ptr::null_mut());
}

#[test]
fn test_ffi_rejects_invalid_config() {
    use crate::ffi::memlane_engine_new;

    assert!(memlane_engine_new(1000, 4096, 1, false).is_null());
}

#[test]
fn test_ffi_seed_heights() {
    use crate::ffi::{memlane_seed_height, memlane_seed_heights};

    assert_eq!(memlane_seed_height(7_499), 0);

    let (mut current, mut next) = (0u64, 0u64);
    memlane_seed_heights(10_000, &mut current, &mut next);
    assert_eq!((current, next), (7_500, 15_000));

    // Last epoch before u64::MAX: the next seed height saturates
    memlane_seed_heights(u64::MAX, &mut current, &mut next);
    assert_eq!(current, (u64::MAX / 7_500) * 7_500);
    assert_eq!(next, u64::MAX);
}

#[test]
fn test_seed_hash_parses_from_hex() {
    let engine = engine();
    let seed: SeedHash = "00".repeat(32).parse().unwrap();

    assert_eq!(seed, SeedHash::default());
    assert_eq!(
        engine.compute_hash(&seed, b"header", 0),
        engine.compute_hash(&SeedHash::new([0; 32]), b"header", 0)
    );
}
