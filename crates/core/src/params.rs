//! Memlane Algorithm Parameters
//!
//! These parameters are tuned for GPUs: the register file and lane count
//! match a warp's natural width, and the dataset is far larger than any
//! on-die memory.

/// Blocks per epoch (one seed hash, one cache/dataset pair)
pub const EPOCH_LENGTH: u64 = 7_500;

/// Blocks per period (one random program)
pub const PERIOD_LENGTH: u64 = 3;

/// Parallel lanes for a single hash instance
pub const LANES: usize = 16;

/// Register file size per lane
pub const REGS: usize = 32;

/// u32 loads from the dataset per lane per iteration
pub const DAG_LOADS: usize = 4;

/// Dataset item size in bytes
pub const ITEM_SIZE: usize = DAG_LOADS * 4;

/// Number of dataset accesses (outer loop)
pub const CNT_DAG: usize = 64;

/// Cache accesses per iteration
pub const CNT_CACHE: usize = 11;

/// Math operations per iteration
pub const CNT_MATH: usize = 18;

/// Sub-steps per iteration (cache and math operations interleave)
pub const CNT_STEPS: usize = if CNT_CACHE > CNT_MATH {
    CNT_CACHE
} else {
    CNT_MATH
};

/// Default cache size in bytes (16 KB)
pub const CACHE_SIZE: usize = 16 * 1024;

/// Sequential memory-hard passes over the cache after expansion
pub const CACHE_ROUNDS: usize = 3;

/// Default dataset item count (1 GB of 16-byte items)
pub const DATASET_ITEMS: usize = 1 << 26;

/// Cache words folded into every dataset item
pub const DATASET_PARENTS: u32 = 64;

/// Sponge state width in 32-bit words
pub const SPONGE_WORDS: usize = 25;

/// Sponge rate: input words absorbed, the rest are dropped
pub const SPONGE_RATE: usize = 18;

/// Header words carried into the final compression
pub const HEADER_WORDS: usize = 8;

/// Output hash size
pub const HASH_SIZE: usize = 32;

/// Algorithm version
pub const VERSION: u8 = 1;
