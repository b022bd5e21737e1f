//! Per-period random program
//!
//! Every `PERIOD_LENGTH` blocks the sequence of cache reads, math operations
//! and dataset merges changes. The program is a pure function of the period
//! index, so miners and verifiers derive the same one independently.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::kiss99::Kiss99;
use crate::params::{CNT_CACHE, CNT_MATH, CNT_STEPS, DAG_LOADS, PERIOD_LENGTH};
use crate::primitives::{FNV_OFFSET_BASIS, fnv1a};

/// `regs[dst] = merge(regs[dst], cache[regs[src]], merge)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheOp {
    pub src: usize,
    pub dst: usize,
    pub merge: u32,
}

/// `regs[dst] = merge(regs[dst], math(regs[src_a], regs[src_b], math), merge)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MathOp {
    pub src_a: usize,
    pub src_b: usize,
    pub dst: usize,
    pub math: u32,
    pub merge: u32,
}

/// `regs[dst] = merge(regs[dst], dataset_word, merge)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DagMerge {
    pub dst: usize,
    pub merge: u32,
}

/// Instruction slots of one iteration, reused by every iteration of the period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub period: u64,
    pub cache_ops: [CacheOp; CNT_CACHE],
    pub math_ops: [MathOp; CNT_MATH],
    pub dag_merges: [DagMerge; DAG_LOADS],
}

impl Program {
    /// Derive the program for a period index
    ///
    /// Draws are interleaved the way the ops execute: at sub-step `i` a cache
    /// op while `i < CNT_CACHE`, then a math op while `i < CNT_MATH`. The
    /// dataset merges come last; load 0 always lands in register 0.
    pub fn derive(period: u64) -> Self {
        let lo = period as u32;
        let hi = (period >> 32) as u32;

        let z = fnv1a(FNV_OFFSET_BASIS, lo);
        let w = fnv1a(z, hi);
        let jsr = fnv1a(w, lo);
        let jcong = fnv1a(jsr, hi);
        let mut rng = Kiss99::new(z, w, jsr, jcong);

        let mut cache_ops = [CacheOp::default(); CNT_CACHE];
        let mut math_ops = [MathOp::default(); CNT_MATH];

        for i in 0..CNT_STEPS {
            if i < CNT_CACHE {
                cache_ops[i] = CacheOp {
                    src: rng.next_reg(),
                    dst: rng.next_reg(),
                    merge: rng.next_u32(),
                };
            }
            if i < CNT_MATH {
                math_ops[i] = MathOp {
                    src_a: rng.next_reg(),
                    src_b: rng.next_reg(),
                    dst: rng.next_reg(),
                    math: rng.next_u32(),
                    merge: rng.next_u32(),
                };
            }
        }

        let mut dag_merges = [DagMerge::default(); DAG_LOADS];
        for (load, slot) in dag_merges.iter_mut().enumerate() {
            let dst = if load == 0 { 0 } else { rng.next_reg() };
            *slot = DagMerge {
                dst,
                merge: rng.next_u32(),
            };
        }

        Self {
            period,
            cache_ops,
            math_ops,
            dag_merges,
        }
    }

    /// Derive the program that applies at block `height`
    pub fn for_height(height: u64) -> Self {
        Self::derive(period_of(height))
    }
}

/// Period index of `height`
#[inline]
pub const fn period_of(height: u64) -> u64 {
    height / PERIOD_LENGTH
}

/// Most recently used program
///
/// Consecutive hashes almost always share a period, so only one program is
/// kept; a height from another period replaces it.
#[derive(Default)]
pub struct ProgramCache {
    current: Mutex<Option<Arc<Program>>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, height: u64) -> Arc<Program> {
        let period = period_of(height);
        let mut current = self.current.lock();

        if let Some(program) = current.as_ref().filter(|p| p.period == period) {
            return Arc::clone(program);
        }

        log::debug!("Deriving program for period {} (height {})", period, height);
        let program = Arc::new(Program::derive(period));
        *current = Some(Arc::clone(&program));
        program
    }
}
