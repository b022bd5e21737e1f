//! Per-thread hashing context

use core::fmt;
use core::mem::size_of;
use std::sync::Arc;

use crate::engine::{Engine, LaneState};
use crate::error::{Error, Result};
use crate::params::{HASH_SIZE, LANES, REGS};
use crate::seed::SeedHash;

/// Identifies a mining thread in logs; never affects hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MinerThreadTag(pub u32);

impl fmt::Display for MinerThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A worker thread's view of the engine
///
/// Owns its lane state so repeated hashes reuse one allocation. Workers are
/// `Send` and meant to be moved into their thread.
pub struct Worker {
    engine: Arc<Engine>,
    tag: MinerThreadTag,
    lanes: Option<Box<LaneState>>,
}

impl Worker {
    pub fn new(engine: Arc<Engine>, tag: MinerThreadTag) -> Self {
        Self {
            engine,
            tag,
            lanes: None,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn tag(&self) -> MinerThreadTag {
        self.tag
    }

    pub fn set_tag(&mut self, tag: MinerThreadTag) {
        self.tag = tag;
    }

    pub fn has_state(&self) -> bool {
        self.lanes.is_some()
    }

    /// Allocate lane state; does nothing if already allocated
    pub fn allocate_state(&mut self) -> Result<()> {
        if self.lanes.is_none() {
            self.lanes = Some(allocate_lanes()?);
            log::debug!("Worker {} allocated {} bytes of lane state", self.tag, size_of::<LaneState>());
        }
        Ok(())
    }

    /// Release lane state; does nothing if not allocated
    pub fn free_state(&mut self) {
        if self.lanes.take().is_some() {
            log::debug!("Worker {} freed lane state", self.tag);
        }
    }

    /// Hash `header` at `height` against the epoch of `seed`
    ///
    /// Allocates lane state on first use. Lane state allocation is the only
    /// failure.
    pub fn compute_hash(&mut self, seed: &SeedHash, header: &[u8], height: u64) -> Result<[u8; HASH_SIZE]> {
        self.allocate_state()?;
        let lanes = match self.lanes.as_mut() {
            Some(lanes) => lanes,
            None => return Err(lane_oom()),
        };
        Ok(self.engine.compute_hash_with(lanes, seed, header, height))
    }
}

fn lane_oom() -> Error {
    Error::OutOfMemory {
        what: "lane state",
        bytes: size_of::<LaneState>(),
    }
}

fn allocate_lanes() -> Result<Box<LaneState>> {
    let mut lanes: Vec<[u32; REGS]> = Vec::new();
    lanes.try_reserve_exact(LANES).map_err(|_| lane_oom())?;
    lanes.resize(LANES, [0u32; REGS]);
    lanes.into_boxed_slice().try_into().map_err(|_| lane_oom())
}
