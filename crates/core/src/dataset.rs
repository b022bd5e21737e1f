//! Full dataset
//!
//! The large memory-hard buffer. Every item is an independent function of
//! the cache and its own index, so construction splits across any number of
//! threads and a verifier without the dataset can compute just the items it
//! touches.

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::cache::Cache;
use crate::error::Result;
use crate::memory::{AllocStrategy, Memory};
use crate::params::{DAG_LOADS, DATASET_PARENTS};
use crate::primitives::{FNV_OFFSET_BASIS, blake3_compress, fnv1a};

/// Items filled per parallel task
const ITEMS_PER_TASK: usize = 1024;

/// Something hash lanes can read dataset items from
pub trait ItemSource: Sync {
    fn item_count(&self) -> u32;

    fn item(&self, index: u32) -> [u32; DAG_LOADS];
}

/// Derive one dataset item from the cache
///
///   mix[j] = fnv1a(fnv1a(OFFSET, index), cache[index * 16 + j] ^ j)
///   For p = 0 to DATASET_PARENTS - 1:
///     parent = fnv1a(index ^ p, mix[p mod 16])
///     mix[p mod 16] = fnv1a(mix[p mod 16], cache[parent])
///   item = BLAKE3_Compress([index, DATASET_PARENTS, 0..], mix)[0:DAG_LOADS]
#[inline]
pub fn build_item(cache: &Cache, index: u32) -> [u32; DAG_LOADS] {
    let base = fnv1a(FNV_OFFSET_BASIS, index);
    let first = index.wrapping_mul(16);

    let mut mix = [0u32; 16];
    for (j, m) in mix.iter_mut().enumerate() {
        let j = j as u32;
        *m = fnv1a(base, cache.fetch(first.wrapping_add(j)) ^ j);
    }

    for p in 0..DATASET_PARENTS {
        let j = (p % 16) as usize;
        let parent = fnv1a(index ^ p, mix[j]);
        mix[j] = fnv1a(mix[j], cache.fetch(parent));
    }

    let mut cv = [0u32; 8];
    cv[0] = index;
    cv[1] = DATASET_PARENTS;
    let out = blake3_compress(&cv, &mix);

    core::array::from_fn(|k| out[k])
}

/// Dataset item read by `lane` in iteration `loop_idx`
///
/// Chosen from the lane's register 0 at the start of the iteration.
#[inline(always)]
pub fn item_index(mix0: u32, loop_idx: u32, lane: u32, items: u32) -> u32 {
    fnv1a(fnv1a(fnv1a(FNV_OFFSET_BASIS, mix0 ^ loop_idx), lane), mix0) % items
}

/// Word of a fetched item that lands in load slot `load` for `lane`
#[inline(always)]
pub fn load_word(item: &[u32; DAG_LOADS], lane: u32, load: usize) -> u32 {
    item[(load + lane as usize) % DAG_LOADS]
}

/// Single dataset word for `(lane, loop_idx, load)` given the lane's register 0
pub fn fetch<S: ItemSource + ?Sized>(source: &S, lane: u32, loop_idx: u32, load: usize, mix0: u32) -> u32 {
    let index = item_index(mix0, loop_idx, lane, source.item_count());
    load_word(&source.item(index), lane, load)
}

/// Resident dataset
pub struct Dataset {
    items: u32,
    memory: Memory,
}

impl Dataset {
    /// Allocate a zeroed dataset of `items` items
    pub fn allocate(items: u32, large_pages: bool) -> Result<Self> {
        let memory = Memory::allocate("dataset", items as usize * DAG_LOADS, large_pages)?;
        Ok(Self { items, memory })
    }

    /// Allocate and fill a dataset from `cache` on `pool`
    pub fn build(cache: &Cache, items: u32, large_pages: bool, pool: &ThreadPool) -> Result<Self> {
        let mut dataset = Self::allocate(items, large_pages)?;
        dataset.fill(cache, pool);
        Ok(dataset)
    }

    /// Recompute every item from `cache`, split across the threads of `pool`
    pub fn fill(&mut self, cache: &Cache, pool: &ThreadPool) {
        let words = self.memory.words_mut();
        pool.install(|| {
            words
                .par_chunks_mut(DAG_LOADS * ITEMS_PER_TASK)
                .enumerate()
                .for_each(|(task, chunk)| {
                    let first = task * ITEMS_PER_TASK;
                    for (k, item) in chunk.chunks_exact_mut(DAG_LOADS).enumerate() {
                        item.copy_from_slice(&build_item(cache, (first + k) as u32));
                    }
                });
        });
    }

    /// Compute items `start..start + count` on the calling thread
    ///
    /// Callers partitioning the index range themselves may run disjoint
    /// ranges in any order.
    pub fn fill_range(&mut self, cache: &Cache, start: u32, count: u32) {
        let end = start.saturating_add(count).min(self.items);
        let words = self.memory.words_mut();
        for index in start..end {
            let offset = index as usize * DAG_LOADS;
            words[offset..offset + DAG_LOADS].copy_from_slice(&build_item(cache, index));
        }
    }

    pub fn strategy(&self) -> AllocStrategy {
        self.memory.strategy()
    }

    pub fn words(&self) -> &[u32] {
        self.memory.words()
    }
}

impl ItemSource for Dataset {
    #[inline(always)]
    fn item_count(&self) -> u32 {
        self.items
    }

    #[inline(always)]
    fn item(&self, index: u32) -> [u32; DAG_LOADS] {
        let offset = index as usize * DAG_LOADS;
        let words = &self.memory.words()[offset..offset + DAG_LOADS];
        core::array::from_fn(|k| words[k])
    }
}

/// Items computed from the cache on demand
///
/// Same values as a resident [`Dataset`], at a much higher cost per read.
pub struct LightItems<'a> {
    cache: &'a Cache,
    items: u32,
}

impl<'a> LightItems<'a> {
    pub fn new(cache: &'a Cache, items: u32) -> Self {
        Self { cache, items }
    }
}

impl ItemSource for LightItems<'_> {
    #[inline(always)]
    fn item_count(&self) -> u32 {
        self.items
    }

    #[inline(always)]
    fn item(&self, index: u32) -> [u32; DAG_LOADS] {
        build_item(self.cache, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedHash;
    use rayon::ThreadPoolBuilder;

    const CACHE_SIZE: usize = 1024;
    const ITEMS: u32 = 3000;

    fn pool(threads: usize) -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(threads).build().unwrap()
    }

    #[test]
    fn test_build_item_deterministic_and_distinct() {
        let cache = Cache::build(&SeedHash::new([9; 32]), CACHE_SIZE).unwrap();

        assert_eq!(build_item(&cache, 17), build_item(&cache, 17));
        assert_ne!(build_item(&cache, 17), build_item(&cache, 18));
    }

    #[test]
    fn test_build_identical_across_runs_and_thread_counts() {
        let seed = SeedHash::new([5; 32]);
        let cache_a = Cache::build(&seed, CACHE_SIZE).unwrap();
        let cache_b = Cache::build(&seed, CACHE_SIZE).unwrap();

        let a = Dataset::build(&cache_a, ITEMS, false, &pool(1)).unwrap();
        let b = Dataset::build(&cache_b, ITEMS, false, &pool(4)).unwrap();
        assert_eq!(a.words(), b.words());
    }

    #[test]
    fn test_fill_range_in_any_order_matches_parallel_build() {
        let cache = Cache::build(&SeedHash::new([6; 32]), CACHE_SIZE).unwrap();
        let full = Dataset::build(&cache, ITEMS, false, &pool(2)).unwrap();

        let mut manual = Dataset::allocate(ITEMS, false).unwrap();
        manual.fill_range(&cache, 2000, 5000); // clamped to the item count
        manual.fill_range(&cache, 0, 1000);
        manual.fill_range(&cache, 1000, 1000);

        assert_eq!(full.words(), manual.words());
    }

    #[test]
    fn test_light_items_match_resident() {
        let cache = Cache::build(&SeedHash::new([7; 32]), CACHE_SIZE).unwrap();
        let full = Dataset::build(&cache, ITEMS, false, &pool(2)).unwrap();
        let light = LightItems::new(&cache, ITEMS);

        for index in [0, 1, 1023, 1024, ITEMS - 1] {
            assert_eq!(full.item(index), light.item(index));
        }
        for lane in 0..4 {
            assert_eq!(
                fetch(&full, lane, 3, 2, 0xABCD_0123),
                fetch(&light, lane, 3, 2, 0xABCD_0123)
            );
        }
    }

    #[test]
    fn test_item_index_in_range() {
        for mix0 in [0u32, 1, 0xFFFF_FFFF, 0x1234_5678] {
            for loop_idx in 0..8 {
                assert!(item_index(mix0, loop_idx, 3, ITEMS) < ITEMS);
            }
        }
    }

    #[test]
    fn test_load_words_cover_item() {
        let item = [10, 11, 12, 13];
        let mut seen: Vec<u32> = (0..DAG_LOADS).map(|l| load_word(&item, 5, l)).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![10, 11, 12, 13]);
    }
}
