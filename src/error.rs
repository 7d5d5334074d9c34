//! Construction-time errors.
//!
//! Only building a [`Cache`](crate::Cache) can fail. Every runtime anomaly
//! (missing key, collision, stale locator, torn big value) is reported as a
//! plain miss instead.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reasons a cache cannot be built from a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_bytes must be greater than zero")]
    ZeroCapacity,
    #[error("bucket count must be greater than zero")]
    ZeroBuckets,
    #[error("max_bytes {max_bytes} leaves no arena space for each of {buckets} buckets")]
    CapacityTooSmall { max_bytes: usize, buckets: usize },
    #[error("arena size {arena_size} is outside {min}..={max}")]
    ArenaSize {
        arena_size: usize,
        min: usize,
        max: usize,
    },
    #[error("bucket of {bucket_bytes} bytes exceeds the addressable {max} bytes")]
    BucketTooLarge { bucket_bytes: u64, max: u64 },
    #[error("failed to map arena memory: {0}")]
    Allocation(#[from] io::Error),
}
