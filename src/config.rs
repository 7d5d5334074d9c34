//! Cache sizing.
//!
//! A [`Config`] fixes the memory budget, how many buckets it is spread over
//! and how large each arena is. Validation turns it into a [`Layout`]: the
//! per-bucket arena count the cache allocates up front.

use crate::error::{ConfigError, Result};
use crate::storage::locator::MAX_POSITION;

/// Number of independently locked buckets.
pub const DEFAULT_BUCKETS: usize = 512;

/// Size of one arena, and therefore the upper bound on a single record.
pub const DEFAULT_ARENA_SIZE: usize = 64 * 1024;

pub const MIN_ARENA_SIZE: usize = 64;

/// Record lengths are 16-bit, so an arena never needs to be larger.
pub const MAX_ARENA_SIZE: usize = 64 * 1024;

/// Cache sizing parameters.
///
/// ```
/// use arenacache::Config;
///
/// let config = Config::new(32 << 20).with_buckets(64).with_arena_size(16 * 1024);
/// assert_eq!(config.buckets(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    max_bytes: usize,
    buckets: usize,
    arena_size: usize,
}

impl Config {
    pub fn new(max_bytes: usize) -> Self {
        Config {
            max_bytes,
            buckets: DEFAULT_BUCKETS,
            arena_size: DEFAULT_ARENA_SIZE,
        }
    }

    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_arena_size(mut self, arena_size: usize) -> Self {
        self.arena_size = arena_size;
        self
    }

    #[inline]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    #[inline]
    pub fn buckets(&self) -> usize {
        self.buckets
    }

    #[inline]
    pub fn arena_size(&self) -> usize {
        self.arena_size
    }

    /// Check the parameters and work out how many arenas each bucket gets.
    ///
    /// Each bucket's share of `max_bytes` is rounded up to whole arenas, so
    /// every bucket owns at least one.
    pub fn layout(&self) -> Result<Layout> {
        if self.max_bytes == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        if !(MIN_ARENA_SIZE..=MAX_ARENA_SIZE).contains(&self.arena_size) {
            return Err(ConfigError::ArenaSize {
                arena_size: self.arena_size,
                min: MIN_ARENA_SIZE,
                max: MAX_ARENA_SIZE,
            });
        }

        let bucket_share = self.max_bytes / self.buckets;
        if bucket_share == 0 {
            return Err(ConfigError::CapacityTooSmall {
                max_bytes: self.max_bytes,
                buckets: self.buckets,
            });
        }

        let arenas_per_bucket = bucket_share.div_ceil(self.arena_size);
        let bucket_bytes = (arenas_per_bucket as u64).saturating_mul(self.arena_size as u64);
        if bucket_bytes > MAX_POSITION + 1 {
            return Err(ConfigError::BucketTooLarge {
                bucket_bytes,
                max: MAX_POSITION + 1,
            });
        }

        Ok(Layout {
            buckets: self.buckets,
            arenas_per_bucket,
            arena_size: self.arena_size,
        })
    }
}

/// Validated allocation plan derived from a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub buckets: usize,
    pub arenas_per_bucket: usize,
    pub arena_size: usize,
}

impl Layout {
    /// Bytes the cache maps in total.
    pub fn total_bytes(&self) -> usize {
        self.buckets * self.arenas_per_bucket * self.arena_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new(1 << 30);
        assert_eq!(config.max_bytes(), 1 << 30);
        assert_eq!(config.buckets(), DEFAULT_BUCKETS);
        assert_eq!(config.arena_size(), DEFAULT_ARENA_SIZE);

        let layout = config.layout().unwrap();
        assert_eq!(layout.arenas_per_bucket, 32);
        assert_eq!(layout.total_bytes(), 1 << 30);
    }

    #[test]
    fn bucket_share_rounds_up_to_whole_arenas() {
        // 1536 bytes per bucket still gets one full arena.
        let layout = Config::new(12 * 65536).layout().unwrap();
        assert_eq!(layout.arenas_per_bucket, 1);
        assert_eq!(layout.total_bytes(), 512 * 65536);

        let layout = Config::new(1000)
            .with_buckets(2)
            .with_arena_size(128)
            .layout()
            .unwrap();
        assert_eq!(layout.arenas_per_bucket, 4);
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(matches!(
            Config::new(0).layout(),
            Err(ConfigError::ZeroCapacity)
        ));
        assert!(matches!(
            Config::new(1024).with_buckets(0).layout(),
            Err(ConfigError::ZeroBuckets)
        ));
    }

    #[test]
    fn rejects_budget_smaller_than_bucket_count() {
        let err = Config::new(511).layout().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CapacityTooSmall {
                max_bytes: 511,
                buckets: 512
            }
        ));
        assert!(Config::new(512).layout().is_ok());
    }

    #[test]
    fn rejects_arena_size_out_of_range() {
        for size in [0, MIN_ARENA_SIZE - 1, MAX_ARENA_SIZE + 1] {
            let err = Config::new(1 << 20).with_arena_size(size).layout();
            assert!(matches!(err, Err(ConfigError::ArenaSize { .. })), "{size}");
        }
        assert!(Config::new(1 << 20)
            .with_arena_size(MIN_ARENA_SIZE)
            .layout()
            .is_ok());
    }

    #[test]
    fn rejects_buckets_past_locator_range() {
        let err = Config::new(usize::MAX).with_buckets(1).layout();
        assert!(matches!(err, Err(ConfigError::BucketTooLarge { .. })));
    }
}
