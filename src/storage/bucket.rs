//! One shard of the cache: an arena ring, its write cursor, and a hash index.
//!
//! Writes append to the current arena and move to the next one when it is
//! full, wrapping back to arena 0 and bumping the generation at the end of the
//! ring. Nothing is ever deleted individually; an index entry simply stops
//! resolving once the arena it points into has been re-entered.
use std::io;

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::trace;

use super::arena::ArenaRing;
use super::locator::{next_generation, Cursor, Locator};
use super::record;

/// A shard guarded by a reader/writer lock.
///
/// `set` and `reset` take the write lock; lookups share the read lock.
pub struct Bucket {
    arena_size: usize,
    inner: RwLock<BucketInner>,
}

struct BucketInner {
    ring: ArenaRing,
    cursor: Cursor,
    // Keys are xxh64 values with a fixed seed. The per-process ahash state keeps
    // crafted keys from steering them into the same hashbrown probe groups.
    index: HashMap<u64, Locator, RandomState>,
}

impl Bucket {
    pub fn new(arena_count: usize, arena_size: usize) -> io::Result<Self> {
        let ring = ArenaRing::allocate(arena_count, arena_size)?;
        Ok(Bucket {
            arena_size,
            inner: RwLock::new(BucketInner {
                ring,
                cursor: Cursor::START,
                index: HashMap::with_hasher(RandomState::new()),
            }),
        })
    }

    /// Store `key -> value` under `hash`.
    ///
    /// Returns `false` without touching the bucket if the record cannot fit
    /// in a single arena.
    pub fn set(&self, hash: u64, key: &[u8], value: &[u8]) -> bool {
        let fits = record::encoded_len(key.len(), value.len())
            .filter(|&len| len <= self.arena_size);
        match fits {
            Some(len) => {
                self.inner.write().insert(hash, key, value, len);
                true
            }
            None => {
                trace!(
                    key_len = key.len(),
                    value_len = value.len(),
                    "bucket.set.oversized"
                );
                false
            }
        }
    }

    /// Append the value stored for `key` to `dst`. Returns whether it was found.
    #[inline]
    pub fn get(&self, dst: &mut Vec<u8>, hash: u64, key: &[u8]) -> bool {
        self.with_value(hash, key, |value| dst.extend_from_slice(value))
            .is_some()
    }

    #[inline]
    pub fn has(&self, hash: u64, key: &[u8]) -> bool {
        self.inner.read_recursive().lookup(hash, key).is_some()
    }

    /// Run `f` on the stored value while the read lock is held.
    ///
    /// Lookups take the lock recursively, so `f` may read this bucket again
    /// even while a writer is queued. Writing to it from `f` deadlocks.
    #[inline]
    pub fn with_value<R>(&self, hash: u64, key: &[u8], f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let inner = self.inner.read_recursive();
        inner.lookup(hash, key).map(f)
    }

    /// Drop every entry and rewind to the first arena of generation 1.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.index.clear();
        inner.ring.rewind_all();
        inner.cursor = Cursor::START;
    }

    /// Bytes mapped for this bucket's arenas.
    pub fn capacity(&self) -> usize {
        self.inner.read().ring.capacity()
    }

    #[cfg(test)]
    fn cursor(&self) -> Cursor {
        self.inner.read().cursor
    }

    #[cfg(test)]
    fn index_len(&self) -> usize {
        self.inner.read().index.len()
    }
}

impl BucketInner {
    fn lookup(&self, hash: u64, key: &[u8]) -> Option<&[u8]> {
        let locator = *self.index.get(&hash)?;
        let (arena, offset) = self.cursor.resolve(locator, self.ring.arena_size())?;
        let rec = self.ring.record(arena, offset)?;
        // Same hash, different key: a collision, not a hit.
        (rec.key == key).then_some(rec.value)
    }

    fn insert(&mut self, hash: u64, key: &[u8], value: &[u8], len: usize) {
        if self.ring.remaining(self.cursor.arena) < len {
            self.advance();
        }
        // `len` was checked against the arena size, and the arena is empty
        // after `advance`, so this only fails on a broken invariant.
        let appended = self.ring.append(self.cursor.arena, key, value);
        debug_assert!(appended.is_some(), "record did not fit in a fresh arena");
        let Some(offset) = appended else {
            return;
        };
        let locator = Locator::new(
            self.cursor.generation,
            self.cursor.position(self.ring.arena_size()),
        );
        debug_assert_eq!(offset, self.cursor.offset);
        self.cursor.offset = offset + len;
        self.index.insert(hash, locator);
    }

    /// Move the cursor into the next arena, discarding whatever it held.
    fn advance(&mut self) {
        let next = self.cursor.arena + 1;
        let wrapped = next == self.ring.arena_count();
        if wrapped {
            self.cursor.arena = 0;
            self.cursor.generation = next_generation(self.cursor.generation);
        } else {
            self.cursor.arena = next;
        }
        self.cursor.offset = 0;
        self.ring.rewind(self.cursor.arena);

        if wrapped {
            self.prune();
        }
    }

    /// Remove index entries that can no longer resolve.
    fn prune(&mut self) {
        let before = self.index.len();
        let cursor = self.cursor;
        let arena_size = self.ring.arena_size();
        self.index
            .retain(|_, locator| cursor.resolve(*locator, arena_size).is_some());
        trace!(
            generation = cursor.generation,
            pruned = before - self.index.len(),
            remaining = self.index.len(),
            "bucket.wrap"
        );
    }
}
