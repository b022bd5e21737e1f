//! Memlane hash engine
//!
//! One hash runs 16 independent lanes of 32 registers each:
//! - Seed: Keccak-f[800] sponge over the header gives a 64-bit internal seed
//! - Lane init: KISS99 seeded from the internal seed and lane index fills the registers
//! - Mix: CNT_DAG iterations, each a dataset fetch, the period's cache and math
//!   ops interleaved, then the fetched words merged back in
//! - Reduce: FNV-1a fold per lane, lanes folded into 8 words
//! - Output: sponge compression of header, internal seed and the 8 words

use crate::cache::Cache;
use crate::config::{EngineConfig, Flags};
use crate::dataset::{ItemSource, LightItems, item_index, load_word};
use crate::epoch::{Epoch, EpochManager};
use crate::error::Result;
use crate::kiss99::fill_mix;
use crate::params::*;
use crate::primitives::{FNV_OFFSET_BASIS, fnv1a, math, merge};
use crate::program::{Program, ProgramCache};
use crate::seed::SeedHash;
use crate::sponge::{self, HeaderWords};

/// Register state of every lane of one hash
pub type LaneState = [[u32; REGS]; LANES];

/// Shared hash engine
///
/// Holds the epoch state and program cache. `&Engine` is all a worker
/// thread needs; wrap it in an `Arc` to share.
pub struct Engine {
    config: EngineConfig,
    flags: Flags,
    epochs: EpochManager,
    programs: ProgramCache,
}

impl Engine {
    /// Create an engine, allocating its cache and dataset
    pub fn new(config: EngineConfig) -> Result<Self> {
        let epochs = EpochManager::new(&config)?;
        Ok(Self::with_epochs(config, epochs))
    }

    pub(crate) fn with_epochs(config: EngineConfig, epochs: EpochManager) -> Self {
        let flags = Flags::detect(&config);

        log::info!(
            "Memlane v{} engine: cache {} bytes, {} dataset items ({})",
            VERSION,
            config.cache_size,
            config.dataset_items,
            flags
        );
        if epochs.is_light() {
            log::info!("Dataset not resident, items are computed from the cache");
        }

        Self {
            config,
            flags,
            epochs,
            programs: ProgramCache::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Dataset items are synthesized from the cache instead of read
    pub fn is_light(&self) -> bool {
        self.epochs.is_light()
    }

    pub fn main_seed_hash(&self) -> Option<SeedHash> {
        self.epochs.current_seed()
    }

    /// Publish a new main seed hash, rebuilding cache and dataset if it changed
    pub fn set_main_seed_hash(&self, seed: &SeedHash) {
        self.epochs.set_main_seed_hash(seed);
    }

    /// Block until cache and dataset match `seed`
    pub fn ensure_ready(&self, seed: &SeedHash) {
        self.epochs.ensure_ready(seed);
    }

    /// Hash `header` at `height` against the epoch of `seed`
    ///
    /// A seed other than the published one triggers a synchronous rebuild.
    pub fn compute_hash(&self, seed: &SeedHash, header: &[u8], height: u64) -> [u8; HASH_SIZE] {
        let mut lanes = [[0u32; REGS]; LANES];
        self.compute_hash_with(&mut lanes, seed, header, height)
    }

    /// Same as [`compute_hash`](Self::compute_hash), reusing caller-owned lane state
    pub fn compute_hash_with(
        &self,
        lanes: &mut LaneState,
        seed: &SeedHash,
        header: &[u8],
        height: u64,
    ) -> [u8; HASH_SIZE] {
        let program = self.programs.get(height);
        self.epochs
            .with_epoch(seed, |epoch| hash_epoch(epoch, &program, header, lanes))
    }
}

fn hash_epoch(epoch: &Epoch, program: &Program, header: &[u8], lanes: &mut LaneState) -> [u8; HASH_SIZE] {
    match epoch.dataset() {
        Some(dataset) => hash_with(dataset, epoch.cache(), program, header, lanes),
        None => {
            let light = LightItems::new(epoch.cache(), epoch.items());
            hash_with(&light, epoch.cache(), program, header, lanes)
        }
    }
}

/// Full hash pipeline against an explicit item source, cache and program
pub fn hash_with<S: ItemSource + ?Sized>(
    source: &S,
    cache: &Cache,
    program: &Program,
    header: &[u8],
    lanes: &mut LaneState,
) -> [u8; HASH_SIZE] {
    let header = HeaderWords::new(header);
    let seed = sponge::derive_seed(&header);

    for (lane, regs) in lanes.iter_mut().enumerate() {
        fill_mix(seed, lane as u32, regs);
    }

    for loop_idx in 0..CNT_DAG as u32 {
        for (lane, regs) in lanes.iter_mut().enumerate() {
            mix_round(source, cache, program, loop_idx, lane as u32, regs);
        }
    }

    sponge::compress(&header, seed, &reduce(lanes))
}

/// One iteration of one lane
#[inline(always)]
fn mix_round<S: ItemSource + ?Sized>(
    source: &S,
    cache: &Cache,
    program: &Program,
    loop_idx: u32,
    lane: u32,
    regs: &mut [u32; REGS],
) {
    let item = source.item(item_index(regs[0], loop_idx, lane, source.item_count()));

    for i in 0..CNT_STEPS {
        if i < CNT_CACHE {
            let op = &program.cache_ops[i];
            let data = cache.fetch(regs[op.src]);
            regs[op.dst] = merge(regs[op.dst], data, op.merge);
        }
        if i < CNT_MATH {
            let op = &program.math_ops[i];
            let data = math(regs[op.src_a], regs[op.src_b], op.math);
            regs[op.dst] = merge(regs[op.dst], data, op.merge);
        }
    }

    for (load, slot) in program.dag_merges.iter().enumerate() {
        regs[slot.dst] = merge(regs[slot.dst], load_word(&item, lane, load), slot.merge);
    }
}

/// Fold every lane into 8 words
#[inline]
fn reduce(lanes: &LaneState) -> [u32; 8] {
    let mut out = [FNV_OFFSET_BASIS; 8];
    for (lane, regs) in lanes.iter().enumerate() {
        let digest = regs.iter().fold(FNV_OFFSET_BASIS, |h, r| fnv1a(h, *r));
        out[lane % 8] = fnv1a(out[lane % 8], digest);
    }
    out
}
