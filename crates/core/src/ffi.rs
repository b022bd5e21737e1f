//! C FFI bindings for miners and node software written in other languages

use core::slice;

use crate::{Engine, EngineConfig, HASH_SIZE, SeedHash, seed_height, seed_heights};

/// Opaque engine handle for FFI
pub struct MemlaneEngine {
    inner: Engine,
}

/// Create an engine
/// - cache_size: cache bytes (0 = default)
/// - dataset_items: dataset items (0 = default)
/// - init_threads: dataset init threads (0 = one per CPU)
/// - full_dataset: false for light (verify-only) mode
///
/// Returns null on failure. The caller must free with memlane_engine_free.
#[unsafe(no_mangle)]
pub extern "C" fn memlane_engine_new(
    cache_size: usize,
    dataset_items: usize,
    init_threads: u32,
    full_dataset: bool,
) -> *mut MemlaneEngine {
    let mut config = EngineConfig::default()
        .with_init_threads(init_threads as usize)
        .with_full_dataset(full_dataset);
    if cache_size != 0 {
        config = config.with_cache_size(cache_size);
    }
    if dataset_items != 0 {
        config = config.with_dataset_items(dataset_items);
    }

    match Engine::new(config) {
        Ok(inner) => Box::into_raw(Box::new(MemlaneEngine { inner })),
        Err(e) => {
            log::error!("memlane_engine_new: {}", e);
            core::ptr::null_mut()
        }
    }
}

/// Free an engine
#[unsafe(no_mangle)]
pub extern "C" fn memlane_engine_free(engine: *mut MemlaneEngine) {
    if !engine.is_null() {
        unsafe {
            let _ = Box::from_raw(engine);
        }
    }
}

/// Publish a new main seed hash (32 bytes), rebuilding if it changed
#[unsafe(no_mangle)]
pub extern "C" fn memlane_set_main_seed_hash(engine: *const MemlaneEngine, seed: *const u8) {
    if engine.is_null() || seed.is_null() {
        return;
    }

    unsafe {
        let engine = &*engine;
        engine.inner.set_main_seed_hash(&read_seed(seed));
    }
}

/// Compute a hash
/// - engine: pointer from memlane_engine_new()
/// - seed: pointer to the 32-byte seed hash
/// - header: pointer to header bytes
/// - header_len: length of header
/// - height: block height
/// - output: pointer to 32-byte buffer for result
///
/// Returns false if any pointer is null.
#[unsafe(no_mangle)]
pub extern "C" fn memlane_hash(
    engine: *const MemlaneEngine,
    seed: *const u8,
    header: *const u8,
    header_len: usize,
    height: u64,
    output: *mut u8,
) -> bool {
    if engine.is_null() || seed.is_null() || output.is_null() || (header.is_null() && header_len != 0) {
        return false;
    }

    unsafe {
        let engine = &*engine;
        let header = if header_len == 0 {
            &[][..]
        } else {
            slice::from_raw_parts(header, header_len)
        };
        let result = engine.inner.compute_hash(&read_seed(seed), header, height);

        let output_slice = slice::from_raw_parts_mut(output, HASH_SIZE);
        output_slice.copy_from_slice(&result);
    }
    true
}

/// First height of the epoch containing `height`
#[unsafe(no_mangle)]
pub extern "C" fn memlane_seed_height(height: u64) -> u64 {
    seed_height(height)
}

/// First heights of the epoch containing `height` and of the next one
#[unsafe(no_mangle)]
pub extern "C" fn memlane_seed_heights(height: u64, current: *mut u64, next: *mut u64) {
    let (start, following) = seed_heights(height);
    unsafe {
        if !current.is_null() {
            *current = start;
        }
        if !next.is_null() {
            *next = following;
        }
    }
}

unsafe fn read_seed(seed: *const u8) -> SeedHash {
    let mut bytes = [0u8; HASH_SIZE];
    unsafe {
        bytes.copy_from_slice(slice::from_raw_parts(seed, HASH_SIZE));
    }
    SeedHash::new(bytes)
}
