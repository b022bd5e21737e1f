//! Errors surfaced to the owner of an engine or worker
//!
//! Everything here is fatal for the hash that hit it. Recoverable
//! degradation (large pages unavailable, dataset too big) is logged and
//! handled internally instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Out of memory: unable to allocate {bytes} bytes for {what}")]
    OutOfMemory { what: &'static str, bytes: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start dataset init threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = core::result::Result<T, Error>;
