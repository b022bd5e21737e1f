//! Keccak-f[800] sponge
//!
//! Used twice per hash: once to derive the 64-bit internal seed from the
//! header, and once to compress the lane digest into the output hash.

use crate::params::{HASH_SIZE, HEADER_WORDS, SPONGE_RATE, SPONGE_WORDS};

/// Header reinterpreted as the sponge's absorb words
///
/// Little-endian u32 words; a trailing partial word is zero-padded, short
/// headers are zero-padded and anything past the rate is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderWords([u32; SPONGE_RATE]);

impl HeaderWords {
    pub fn new(header: &[u8]) -> Self {
        let mut words = [0u32; SPONGE_RATE];
        for (word, chunk) in words.iter_mut().zip(header.chunks(4)) {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            *word = u32::from_le_bytes(bytes);
        }
        Self(words)
    }

    #[inline]
    pub fn words(&self) -> &[u32; SPONGE_RATE] {
        &self.0
    }
}

#[inline(always)]
fn permute(state: &mut [u32; SPONGE_WORDS]) {
    keccak::f800(state);
}

/// Derive the internal seed from the header
pub fn derive_seed(header: &HeaderWords) -> u64 {
    let mut state = [0u32; SPONGE_WORDS];
    state[..SPONGE_RATE].copy_from_slice(header.words());
    permute(&mut state);

    ((state[0] as u64) << 32) | state[1] as u64
}

/// Compress header, internal seed and the final lane digest into the output hash
pub fn compress(header: &HeaderWords, seed: u64, digest: &[u32; 8]) -> [u8; HASH_SIZE] {
    let mut state = [0u32; SPONGE_WORDS];
    state[..HEADER_WORDS].copy_from_slice(&header.words()[..HEADER_WORDS]);
    state[HEADER_WORDS] = (seed >> 32) as u32;
    state[HEADER_WORDS + 1] = seed as u32;
    state[HEADER_WORDS + 2..HEADER_WORDS + 10].copy_from_slice(digest);
    permute(&mut state);

    let mut out = [0u8; HASH_SIZE];
    for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}
