//! Seed hashes and epoch arithmetic

use core::fmt;
use core::str::FromStr;

use sha2::{Digest, Sha256};

use crate::params::{EPOCH_LENGTH, HASH_SIZE};

/// 32-byte epoch identifier
///
/// Chosen by the blockchain layer (normally the hash of the block at the
/// epoch's seed height). Two epochs are the same iff their seed hashes are.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeedHash([u8; HASH_SIZE]);

impl SeedHash {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for SeedHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for SeedHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for SeedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for SeedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeedHash({})", self)
    }
}

impl FromStr for SeedHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// First height of the epoch containing `height`
#[inline]
pub const fn seed_height(height: u64) -> u64 {
    (height / EPOCH_LENGTH) * EPOCH_LENGTH
}

/// First height of the epoch containing `height`, and of the epoch after it
///
/// In the last epoch that fits in a `u64` the next seed height saturates at
/// `u64::MAX`.
#[inline]
pub const fn seed_heights(height: u64) -> (u64, u64) {
    let start = seed_height(height);
    (start, start.saturating_add(EPOCH_LENGTH))
}

/// Epoch number of `height`
#[inline]
pub const fn epoch_number(height: u64) -> u64 {
    height / EPOCH_LENGTH
}

/// Domain tag for locally derived seed hashes
const EPOCH_SEED_DOMAIN: &[u8] = b"MEMLANE_EPOCH_SEED_V1";

/// Deterministic seed hash for an epoch number
///
/// For test networks and benchmarks with no chain to supply a seed block.
pub fn epoch_seed_hash(epoch: u64) -> SeedHash {
    let mut h = Sha256::new();
    h.update(EPOCH_SEED_DOMAIN);
    h.update(epoch.to_le_bytes());
    let out = h.finalize();

    let mut seed = [0u8; HASH_SIZE];
    seed.copy_from_slice(&out[..HASH_SIZE]);
    SeedHash(seed)
}

/// Check a hash against a difficulty
///
/// The hash is read as a little-endian 256-bit integer; it passes when
/// `hash * difficulty` still fits in 256 bits.
pub fn check_difficulty(hash: &[u8; HASH_SIZE], difficulty: u64) -> bool {
    let mut carry: u128 = 0;
    for chunk in hash.chunks_exact(8) {
        let limb = u64::from_le_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]);
        let product = limb as u128 * difficulty as u128 + carry;
        carry = product >> 64;
    }
    carry == 0
}
