//! Light cache
//!
//! A small seed-derived buffer, rebuilt once per epoch. It is read directly
//! by the cache operations of every hash and is the only input to dataset
//! item generation.

use crate::error::Result;
use crate::memory::Memory;
use crate::params::CACHE_ROUNDS;
use crate::primitives::{aes_expand_block, fnv1a};
use crate::seed::SeedHash;

pub struct Cache {
    seed: SeedHash,
    memory: Memory,
}

impl Cache {
    /// Allocate and fill a cache of `size` bytes for `seed`
    ///
    /// `size` must be a non-zero multiple of 16, see
    /// [`EngineConfig::validate`](crate::EngineConfig::validate).
    pub fn build(seed: &SeedHash, size: usize) -> Result<Self> {
        let mut cache = Self::allocate(size)?;
        cache.rebuild(seed);
        Ok(cache)
    }

    /// Allocate a zeroed cache of `size` bytes, not yet filled for any seed
    pub fn allocate(size: usize) -> Result<Self> {
        Ok(Self {
            seed: SeedHash::default(),
            memory: Memory::allocate("cache", size / 4, false)?,
        })
    }

    /// Refill in place for a new seed, reusing the allocation
    pub fn rebuild(&mut self, seed: &SeedHash) {
        fill(self.memory.words_mut(), seed);
        self.seed = *seed;
    }

    pub fn seed(&self) -> &SeedHash {
        &self.seed
    }

    /// Read the word at `index` modulo the cache length
    #[inline(always)]
    pub fn fetch(&self, index: u32) -> u32 {
        let words = self.memory.words();
        words[index as usize % words.len()]
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        self.memory.words()
    }

    pub fn size(&self) -> usize {
        self.memory.len() * 4
    }
}

/// Fill the cache from the seed hash
///
///   material = BLAKE3(seed)
///   key = material[0:16], state = material[16:32]
///   For each 16-byte block i:
///     state = AES_4Rounds(state, key)
///     cache[i] = state
///   Then CACHE_ROUNDS sequential passes, each word folding in its
///   predecessor and a data-dependent partner.
fn fill(words: &mut [u32], seed: &SeedHash) {
    let material = blake3::hash(seed.as_bytes());
    let material = material.as_bytes();

    let mut key = [0u8; 16];
    let mut state = [0u8; 16];
    key.copy_from_slice(&material[..16]);
    state.copy_from_slice(&material[16..]);

    for block in words.chunks_exact_mut(4) {
        state = aes_expand_block(&state, &key);
        for (word, bytes) in block.iter_mut().zip(state.chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
    }

    let n = words.len();
    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let prev = words[(i + n - 1) % n];
            let partner = words[words[i] as usize % n];
            words[i] = fnv1a(prev ^ partner, words[i]).rotate_left(13) ^ i as u32;
        }
    }
}
