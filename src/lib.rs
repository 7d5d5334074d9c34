//! Fixed-capacity, sharded, arena-backed byte cache.
//!
//! All memory is mapped when the [`Cache`] is built and split evenly over a
//! fixed number of buckets. Each bucket appends length-prefixed records to a
//! ring of fixed-size arenas and reclaims space one whole arena at a time when
//! the ring wraps, so the footprint never grows and there is no per-entry
//! allocation to free.
//!
//! Values that do not fit in one record go through [`Cache::set_big`] /
//! [`Cache::get_big`], which split them across several entries.
mod big;
mod cache;
mod config;
mod error;
mod hash;
mod key;
mod storage;

pub use cache::Cache;
pub use config::{Config, DEFAULT_ARENA_SIZE, DEFAULT_BUCKETS, MAX_ARENA_SIZE, MIN_ARENA_SIZE};
pub use error::{ConfigError, Result};
pub use key::CacheKey;
