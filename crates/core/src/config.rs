//! Engine configuration and runtime flags

use crate::error::{Error, Result};
use crate::params::{CACHE_SIZE, DATASET_ITEMS};

/// Memory and threading configuration for an [`Engine`](crate::Engine)
///
/// Two engines only agree on hashes when `cache_size` and `dataset_items`
/// match. The remaining fields affect speed, never results.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Cache size in bytes (multiple of 16)
    pub cache_size: usize,
    /// Number of dataset items
    pub dataset_items: usize,
    /// Dataset init threads (0 = one per CPU)
    pub init_threads: usize,
    /// Try huge pages for the dataset
    pub large_pages: bool,
    /// Keep the full dataset resident; otherwise items are computed on demand
    pub full_dataset: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_size: CACHE_SIZE,
            dataset_items: DATASET_ITEMS,
            init_threads: 0,
            large_pages: true,
            full_dataset: true,
        }
    }
}

impl EngineConfig {
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    pub fn with_dataset_items(mut self, items: usize) -> Self {
        self.dataset_items = items;
        self
    }

    pub fn with_init_threads(mut self, threads: usize) -> Self {
        self.init_threads = threads;
        self
    }

    pub fn with_large_pages(mut self, enabled: bool) -> Self {
        self.large_pages = enabled;
        self
    }

    pub fn with_full_dataset(mut self, enabled: bool) -> Self {
        self.full_dataset = enabled;
        self
    }

    /// Check the sizes the algorithm depends on
    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 || self.cache_size % 16 != 0 {
            return Err(Error::InvalidConfig(format!(
                "cache size must be a non-zero multiple of 16 bytes, got {}",
                self.cache_size
            )));
        }
        if self.dataset_items == 0 || self.dataset_items > u32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "dataset item count must be in 1..={}, got {}",
                u32::MAX,
                self.dataset_items
            )));
        }
        Ok(())
    }

    pub fn cache_words(&self) -> usize {
        self.cache_size / 4
    }
}

#[cfg(all(
    not(target_arch = "wasm32"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
cpufeatures::new!(cpuid_aes, "aes");

/// What the engine runs with on this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// CPU has AES instructions (cache init uses them when present)
    pub hard_aes: bool,
    /// Huge pages requested for the dataset
    pub large_pages: bool,
    /// Full dataset resident (otherwise light mode)
    pub full_mem: bool,
}

impl Flags {
    pub fn detect(config: &EngineConfig) -> Self {
        Self {
            hard_aes: hard_aes(),
            large_pages: config.large_pages,
            full_mem: config.full_dataset,
        }
    }
}

#[cfg(all(
    not(target_arch = "wasm32"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
fn hard_aes() -> bool {
    cpuid_aes::get()
}

#[cfg(not(all(
    not(target_arch = "wasm32"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
)))]
fn hard_aes() -> bool {
    false
}

impl core::fmt::Display for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "hard_aes={} large_pages={} full_mem={}",
            self.hard_aes, self.large_pages, self.full_mem
        )
    }
}
