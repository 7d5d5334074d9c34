use std::fmt;

use tracing::debug;

use crate::config::{Config, Layout};
use crate::error::Result;
use crate::hash::{bucket_index, hash_key};
use crate::key::CacheKey;
use crate::storage::record::RECORD_HEADER_LEN;
use crate::storage::Bucket;

/// Fixed-capacity concurrent byte cache.
///
/// Entries are spread over a fixed array of buckets by key hash. Each bucket
/// owns its arenas and lock, so operations on different buckets never
/// contend. All memory is mapped in [`Cache::new`]; nothing grows afterwards.
///
/// Entries may disappear at any time once their bucket's arena ring wraps.
/// There is no per-key delete.
///
/// ```
/// use arenacache::Cache;
///
/// let cache = Cache::new(32 << 20).unwrap();
/// cache.set(42u64, b"xyza");
///
/// let mut buf = Vec::new();
/// assert!(cache.get(&mut buf, 42u64));
/// assert_eq!(buf, b"xyza");
/// assert!(!cache.has(43u64));
/// ```
pub struct Cache {
    buckets: Box<[Bucket]>,
    config: Config,
    layout: Layout,
}

impl Cache {
    /// Build a cache holding roughly `max_bytes` with the default bucket count
    /// and arena size.
    pub fn new(max_bytes: usize) -> Result<Self> {
        Self::with_config(Config::new(max_bytes))
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let layout = config.layout()?;
        let buckets = (0..layout.buckets)
            .map(|_| Bucket::new(layout.arenas_per_bucket, layout.arena_size))
            .collect::<std::io::Result<Vec<_>>>()?
            .into_boxed_slice();

        debug!(
            buckets = layout.buckets,
            arenas_per_bucket = layout.arenas_per_bucket,
            arena_size = layout.arena_size,
            total_bytes = layout.total_bytes(),
            "cache.new"
        );

        Ok(Cache {
            buckets,
            config,
            layout,
        })
    }

    #[inline]
    fn bucket(&self, hash: u64) -> &Bucket {
        &self.buckets[self.bucket_of(hash)]
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Returns `false` and stores nothing when the key and value together do
    /// not fit in one arena record; see [`Cache::max_value_len`]. Use
    /// [`Cache::set_big`] for larger values.
    pub fn set<K: CacheKey>(&self, key: K, value: &[u8]) -> bool {
        let key = key.key_bytes();
        let key = key.as_ref();
        self.set_hashed(hash_key(key), key, value)
    }

    /// `set` for a caller that already has the key's hash.
    #[inline]
    pub(crate) fn set_hashed(&self, hash: u64, key: &[u8], value: &[u8]) -> bool {
        self.bucket(hash).set(hash, key, value)
    }

    /// Index of the bucket `hash` routes to.
    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        bucket_index(hash, self.buckets.len())
    }

    /// Append the value stored under `key` to `dst`.
    ///
    /// Returns `true` on a hit. On a miss `dst` is left untouched.
    pub fn get<K: CacheKey>(&self, dst: &mut Vec<u8>, key: K) -> bool {
        let key = key.key_bytes();
        let key = key.as_ref();
        let hash = hash_key(key);
        self.bucket(hash).get(dst, hash, key)
    }

    /// Owned copy of the value stored under `key`.
    pub fn get_vec<K: CacheKey>(&self, key: K) -> Option<Vec<u8>> {
        self.with_value(key, <[u8]>::to_vec)
    }

    /// Call `f` with a view of the stored value, without copying it.
    ///
    /// The bucket's read lock is held while `f` runs, so writers to that
    /// bucket wait. Keep `f` short.
    ///
    /// # Deadlocks
    ///
    /// `f` may call the read paths (`get`, `has`, `with_value`, `get_big`) of
    /// the same cache. It must not call `set`, `set_big` or `reset`: a write
    /// that lands in the bucket whose lock `f` is holding never returns.
    pub fn with_value<K: CacheKey, R>(&self, key: K, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let key = key.key_bytes();
        let key = key.as_ref();
        let hash = hash_key(key);
        self.bucket(hash).with_value(hash, key, f)
    }

    /// Whether `get` would currently hit for `key`.
    pub fn has<K: CacheKey>(&self, key: K) -> bool {
        let key = key.key_bytes();
        let key = key.as_ref();
        let hash = hash_key(key);
        self.bucket(hash).has(hash, key)
    }

    /// Remove every entry. Capacity and mapped memory are kept.
    pub fn reset(&self) {
        for bucket in self.buckets.iter() {
            bucket.reset();
        }
        debug!(buckets = self.buckets.len(), "cache.reset");
    }

    /// Largest value [`Cache::set`] accepts. The key's length counts against
    /// the same budget.
    #[inline]
    pub fn max_value_len(&self) -> usize {
        self.layout.arena_size - RECORD_HEADER_LEN
    }

    /// Bytes mapped for arenas across all buckets.
    pub fn capacity_bytes(&self) -> usize {
        self.buckets.iter().map(Bucket::capacity).sum()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("buckets", &self.layout.buckets)
            .field("arenas_per_bucket", &self.layout.arenas_per_bucket)
            .field("arena_size", &self.layout.arena_size)
            .finish()
    }
}
