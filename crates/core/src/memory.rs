//! Word buffers for the cache and dataset
//!
//! Large buffers first try an anonymous mapping advised for transparent
//! huge pages; when that is unavailable they fall back to a plain heap
//! allocation. Only failure of the heap allocation is an error.

use memmap2::MmapMut;

use crate::error::{Error, Result};

/// How a buffer ended up being allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocStrategy {
    LargePages,
    Standard,
}

impl core::fmt::Display for AllocStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocStrategy::LargePages => f.write_str("large pages"),
            AllocStrategy::Standard => f.write_str("standard"),
        }
    }
}

enum Backing {
    Mapped(MmapMut),
    Heap(Vec<u32>),
}

/// A zero-initialized, fixed-length buffer of u32 words
pub struct Memory {
    backing: Backing,
    strategy: AllocStrategy,
}

impl Memory {
    /// Allocate `len` words, preferring huge pages when `large_pages` is set
    pub fn allocate(what: &'static str, len: usize, large_pages: bool) -> Result<Self> {
        let bytes = len
            .checked_mul(4)
            .ok_or(Error::OutOfMemory { what, bytes: usize::MAX })?;

        if large_pages && len > 0 {
            match map_large(bytes) {
                Ok(mmap) => {
                    return Ok(Self {
                        backing: Backing::Mapped(mmap),
                        strategy: AllocStrategy::LargePages,
                    });
                }
                Err(e) => {
                    log::debug!(
                        "Large page allocation of {} bytes for {} failed ({}), using standard allocation",
                        bytes,
                        what,
                        e
                    );
                }
            }
        }

        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { what, bytes })?;
        words.resize(len, 0);

        Ok(Self {
            backing: Backing::Heap(words),
            strategy: AllocStrategy::Standard,
        })
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        match &self.backing {
            // Mappings are page aligned and a whole number of words long
            Backing::Mapped(mmap) => bytemuck::cast_slice(&mmap[..]),
            Backing::Heap(words) => words,
        }
    }

    #[inline]
    pub fn words_mut(&mut self) -> &mut [u32] {
        match &mut self.backing {
            Backing::Mapped(mmap) => bytemuck::cast_slice_mut(&mut mmap[..]),
            Backing::Heap(words) => words,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words().len()
    }

    pub fn strategy(&self) -> AllocStrategy {
        self.strategy
    }
}

#[cfg(target_os = "linux")]
fn map_large(bytes: usize) -> std::io::Result<MmapMut> {
    let mmap = memmap2::MmapOptions::new().len(bytes).map_anon()?;
    mmap.advise(memmap2::Advice::HugePage)?;
    Ok(mmap)
}

#[cfg(not(target_os = "linux"))]
fn map_large(_bytes: usize) -> std::io::Result<MmapMut> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "huge page advice is only available on linux",
    ))
}
