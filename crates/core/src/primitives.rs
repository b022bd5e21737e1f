//! Word-level primitives for Memlane
//!
//! Everything here is a pure function over 32-bit words with wrapping
//! arithmetic, which matches GPU native word semantics.

use aes::Block;
use aes::hazmat::cipher_round;

/// FNV-1a prime
pub const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a offset basis
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// Number of math operator variants
pub const MATH_OPS: u32 = 11;

/// Number of merge operator variants
pub const MERGE_OPS: u32 = 4;

/// FNV-1a word mixer
#[inline(always)]
pub fn fnv1a(h: u32, d: u32) -> u32 {
    (h ^ d).wrapping_mul(FNV_PRIME)
}

/// Random math between two register values
///
/// `selector mod 11` picks the operation. Rotations use `b mod 32`.
#[inline(always)]
pub fn math(a: u32, b: u32, selector: u32) -> u32 {
    match selector % MATH_OPS {
        0 => a.wrapping_add(b),
        1 => a.wrapping_mul(b),
        2 => ((a as u64 * b as u64) >> 32) as u32,
        3 => a.min(b),
        4 => a.rotate_left(b % 32),
        5 => a.rotate_right(b % 32),
        6 => a & b,
        7 => a | b,
        8 => a ^ b,
        9 => a.leading_zeros() + b.leading_zeros(),
        _ => a.count_ones() + b.count_ones(),
    }
}

/// Merge new data `b` into register value `a`
///
/// `selector mod 4` picks the operation. Rotation amounts come from the
/// selector's upper half and are never zero, so entropy in `a` is kept.
#[inline(always)]
pub fn merge(a: u32, b: u32, selector: u32) -> u32 {
    let shift = ((selector >> 16) % 31) + 1;
    match selector % MERGE_OPS {
        0 => a.wrapping_mul(33).wrapping_add(b),
        1 => (a ^ b).wrapping_mul(33),
        2 => a.rotate_left(shift) ^ b,
        _ => a.rotate_right(shift) ^ b,
    }
}

/// AES expansion: 4 AESENC rounds with a single key (for cache init)
///
/// Hardware AES is used when the CPU has it; the software path produces
/// identical output.
#[inline(always)]
pub fn aes_expand_block(state: &[u8; 16], key: &[u8; 16]) -> [u8; 16] {
    let key = Block::from(*key);
    let mut block = Block::from(*state);

    cipher_round(&mut block, &key);
    cipher_round(&mut block, &key);
    cipher_round(&mut block, &key);
    cipher_round(&mut block, &key);

    let mut result = [0u8; 16];
    result.copy_from_slice(&block);
    result
}

/// BLAKE3 IV (first 32 bits of the fractional parts of the square roots of the first 8 primes)
const BLAKE3_IV: [u32; 8] = [
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

/// BLAKE3 message schedule, one row per round
const BLAKE3_SCHEDULE: [[usize; 16]; 7] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
    [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
    [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
    [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
    [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
    [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

/// BLAKE3 compression (7 rounds) over words
///
/// Chaining value in, chaining value out; the counter, length and flag
/// words are left at the IV, which is enough for a keyed finalizer.
#[inline(always)]
pub fn blake3_compress(cv: &[u32; 8], block: &[u32; 16]) -> [u32; 8] {
    let mut v = [0u32; 16];
    v[..8].copy_from_slice(cv);
    v[8..].copy_from_slice(&BLAKE3_IV);

    for s in &BLAKE3_SCHEDULE {
        // Columns
        g(&mut v, 0, 4, 8, 12, block[s[0]], block[s[1]]);
        g(&mut v, 1, 5, 9, 13, block[s[2]], block[s[3]]);
        g(&mut v, 2, 6, 10, 14, block[s[4]], block[s[5]]);
        g(&mut v, 3, 7, 11, 15, block[s[6]], block[s[7]]);

        // Diagonals
        g(&mut v, 0, 5, 10, 15, block[s[8]], block[s[9]]);
        g(&mut v, 1, 6, 11, 12, block[s[10]], block[s[11]]);
        g(&mut v, 2, 7, 8, 13, block[s[12]], block[s[13]]);
        g(&mut v, 3, 4, 9, 14, block[s[14]], block[s[15]]);
    }

    core::array::from_fn(|i| v[i] ^ v[i + 8])
}

/// BLAKE3 G mixing function
#[inline(always)]
fn g(v: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, mx: u32, my: u32) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(mx);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(my);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}
