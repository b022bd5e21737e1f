//! Memlane
//!
//! Command-line front end and configuration for the Memlane proof-of-work
//! engine.
//!
//! # Overview
//!
//! Memlane is a memory-hard hash shaped for GPUs: 16 lanes of 32 registers
//! run a program that changes every 3 blocks against a 1 GB dataset that
//! changes every 7,500 blocks. Miners keep the dataset resident; verifiers
//! can run in light mode and compute the items they need from a 16 KB cache.
//!
//! # Example
//!
//! ```rust
//! use memlane::algorithm::{Engine, EngineConfig, epoch_seed_hash};
//!
//! let config = EngineConfig::default()
//!     .with_dataset_items(4096)
//!     .with_full_dataset(false);
//! let engine = Engine::new(config).unwrap();
//!
//! let hash = engine.compute_hash(&epoch_seed_hash(0), b"block header", 1);
//! println!("{}", hex::encode(hash));
//! ```

// Re-export the core algorithm
pub use memlane_core as algorithm;

pub mod config;
pub mod logger;

// Convenience re-exports
pub use algorithm::{Engine, EngineConfig, MinerThreadTag, SeedHash, Worker};
pub use config::Settings;
