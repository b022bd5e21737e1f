//! # Memlane Core Algorithm
//!
//! A memory-hard proof-of-work hash shaped for GPUs: wide lanes of
//! registers, a randomly generated program that changes every few blocks,
//! and a dataset far larger than any cache.
//!
//! ## Algorithm Parameters (v1)
//!
//! - 16 lanes × 32 registers per hash
//! - 64 dataset reads per lane, 16 bytes each
//! - 11 cache reads and 18 math ops per iteration, from a program that
//!   changes every 3 blocks
//! - 16 KB cache and 1 GB dataset, rebuilt every 7,500 blocks
//!
//! ## Pipeline
//!
//! ```text
//! header ──sponge──▶ seed ──KISS99──▶ lane registers
//!                                        │  × 64: dataset item, cache ops,
//!                                        │        math ops, merges
//!                                        ▼
//!                               FNV fold ──sponge──▶ 32-byte hash
//! ```
//!
//! ## Example
//!
//! ```rust
//! use memlane_core::{Engine, EngineConfig, check_difficulty, epoch_seed_hash, seed_height};
//!
//! // Small sizes for the example; defaults are the network sizes
//! let config = EngineConfig::default()
//!     .with_cache_size(1024)
//!     .with_dataset_items(4096)
//!     .with_large_pages(false);
//! let engine = Engine::new(config).unwrap();
//!
//! let height = 12_345;
//! let seed = epoch_seed_hash(seed_height(height));
//! engine.set_main_seed_hash(&seed);
//!
//! let hash = engine.compute_hash(&seed, b"block header", height);
//! let _found = check_difficulty(&hash, 1000);
//! ```
//!
//! ## Sharing
//!
//! An [`Engine`] is `Sync`: put it in an `Arc` and give each mining thread a
//! [`Worker`]. Hashes against the published seed run concurrently; a new
//! seed rebuilds the cache and dataset once while other threads wait.

mod cache;
mod config;
mod dataset;
mod engine;
mod epoch;
mod error;
mod kiss99;
mod memory;
mod params;
mod primitives;
mod program;
mod seed;
mod sponge;
mod worker;

#[cfg(feature = "std")]
mod ffi;

pub use cache::Cache;
pub use config::{EngineConfig, Flags};
pub use dataset::{Dataset, ItemSource, LightItems, build_item, fetch as dataset_fetch};
pub use engine::{Engine, LaneState, hash_with};
pub use epoch::{Epoch, EpochManager};
pub use error::{Error, Result};
pub use kiss99::Kiss99;
pub use memory::AllocStrategy;
pub use params::*;
pub use primitives::{FNV_OFFSET_BASIS, FNV_PRIME, fnv1a, math, merge};
pub use program::{CacheOp, DagMerge, MathOp, Program, ProgramCache, period_of};
pub use seed::{SeedHash, check_difficulty, epoch_number, epoch_seed_hash, seed_height, seed_heights};
pub use worker::{MinerThreadTag, Worker};

#[cfg(test)]
mod tests;
