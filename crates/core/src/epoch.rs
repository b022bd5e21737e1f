//! Epoch state shared by all workers
//!
//! One cache and one dataset serve every hash. They are rebuilt when the
//! seed hash changes, under a read/write lock: hashes for the published seed
//! run concurrently under read guards, a rebuild holds the write guard, and
//! only one of several callers asking for the same new seed does the work.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::cache::Cache;
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::seed::SeedHash;

/// Cache and dataset as seen by a hash
pub struct Epoch {
    seed: Option<SeedHash>,
    cache: Cache,
    dataset: Option<Dataset>,
    items: u32,
}

impl Epoch {
    /// Seed the cache and dataset were built for, `None` before the first build
    pub fn seed(&self) -> Option<&SeedHash> {
        self.seed.as_ref()
    }

    #[inline]
    pub fn is_ready(&self, seed: &SeedHash) -> bool {
        self.seed.as_ref() == Some(seed)
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Resident dataset, `None` in light mode
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn items(&self) -> u32 {
        self.items
    }

    pub fn is_light(&self) -> bool {
        self.dataset.is_none()
    }
}

/// Owner of the shared epoch state
pub struct EpochManager {
    state: RwLock<Epoch>,
    pool: ThreadPool,
    rebuilds: AtomicUsize,
}

impl EpochManager {
    /// Allocate the cache and, unless disabled, the dataset
    ///
    /// Failing to allocate the cache is fatal. Failing to allocate the
    /// dataset drops to light mode.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Self::with_dataset_allocator(config, Dataset::allocate)
    }

    /// Same as [`new`](Self::new), with the dataset allocation supplied by the caller
    pub(crate) fn with_dataset_allocator(
        config: &EngineConfig,
        allocate_dataset: impl FnOnce(u32, bool) -> Result<Dataset>,
    ) -> Result<Self> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.init_threads)
            .thread_name(|i| format!("memlane-init-{}", i))
            .build()?;

        let cache = Cache::allocate(config.cache_size)?;
        let items = config.dataset_items as u32;

        let dataset = if config.full_dataset {
            match allocate_dataset(items, config.large_pages) {
                Ok(dataset) => Some(dataset),
                Err(e) => {
                    log::warn!("{}, falling back to light mode", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            state: RwLock::new(Epoch {
                seed: None,
                cache,
                dataset,
                items,
            }),
            pool,
            rebuilds: AtomicUsize::new(0),
        })
    }

    /// Seed currently published, if any
    pub fn current_seed(&self) -> Option<SeedHash> {
        self.state.read().seed
    }

    pub fn is_light(&self) -> bool {
        self.state.read().is_light()
    }

    /// Number of cache and dataset rebuilds so far
    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Make `seed` the published epoch; a no-op when it already is
    pub fn set_main_seed_hash(&self, seed: &SeedHash) {
        if self.state.read().is_ready(seed) {
            return;
        }
        log::info!("new main seed hash is {}", seed);
        self.with_epoch(seed, |_| ());
    }

    /// Block until the cache and dataset match `seed`
    pub fn ensure_ready(&self, seed: &SeedHash) {
        self.with_epoch(seed, |_| ());
    }

    /// Run `f` against the epoch built for `seed`, rebuilding first if stale
    ///
    /// `f` runs under a read guard, so the state cannot change under it.
    pub fn with_epoch<R>(&self, seed: &SeedHash, f: impl FnOnce(&Epoch) -> R) -> R {
        {
            let epoch = self.state.read();
            if epoch.is_ready(seed) {
                return f(&*epoch);
            }
        }

        let epoch = self.state.upgradable_read();
        // Another caller may have finished the rebuild while we waited
        if epoch.is_ready(seed) {
            return f(&*epoch);
        }

        let mut epoch = RwLockUpgradableReadGuard::upgrade(epoch);
        self.rebuild(&mut *epoch, seed);
        let epoch = RwLockWriteGuard::downgrade(epoch);
        f(&*epoch)
    }

    fn rebuild(&self, epoch: &mut Epoch, seed: &SeedHash) {
        let start = Instant::now();

        epoch.seed = None;
        epoch.cache.rebuild(seed);
        if let Some(dataset) = epoch.dataset.as_mut() {
            dataset.fill(&epoch.cache, &self.pool);
        }
        epoch.seed = Some(*seed);
        self.rebuilds.fetch_add(1, Ordering::Relaxed);

        match epoch.dataset.as_ref() {
            Some(dataset) => log::info!(
                "Epoch {} ready in {:.2?} ({} dataset items, {} allocation, {} threads)",
                seed,
                start.elapsed(),
                epoch.items,
                dataset.strategy(),
                self.pool.current_num_threads()
            ),
            None => log::info!(
                "Epoch {} cache ready in {:.2?} (light mode)",
                seed,
                start.elapsed()
            ),
        }
    }
}
