//! Off-heap arena storage for one bucket.
//!
//! A bucket's arenas are carved out of a single anonymous memory map that is
//! created once and never grows. Arena `i` covers bytes
//! `[i * arena_size, (i + 1) * arena_size)` of the map. Each arena tracks how
//! far it has been written; bytes past that extent are never read.
use std::io;

use memmap2::MmapMut;

use super::record::{self, Record};

/// Fixed ring of equally sized arenas backed by one anonymous mapping.
pub struct ArenaRing {
    map: MmapMut,
    arena_size: usize,
    extents: Box<[usize]>,
}

impl ArenaRing {
    /// Map `arena_count * arena_size` bytes up front.
    pub fn allocate(arena_count: usize, arena_size: usize) -> io::Result<Self> {
        debug_assert!(arena_count > 0 && arena_size > 0);
        let len = arena_count.checked_mul(arena_size).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "arena ring size overflows usize")
        })?;
        let map = MmapMut::map_anon(len)?;
        Ok(ArenaRing {
            map,
            arena_size,
            extents: vec![0; arena_count].into_boxed_slice(),
        })
    }

    #[inline]
    pub fn arena_count(&self) -> usize {
        self.extents.len()
    }

    #[inline]
    pub fn arena_size(&self) -> usize {
        self.arena_size
    }

    /// Total bytes mapped for this ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.map.len()
    }

    #[cfg(test)]
    pub fn extent(&self, index: usize) -> usize {
        self.extents[index]
    }

    /// Bytes still free at the end of arena `index`.
    #[inline]
    pub fn remaining(&self, index: usize) -> usize {
        self.arena_size - self.extents[index]
    }

    /// Forget everything written to arena `index`.
    #[inline]
    pub fn rewind(&mut self, index: usize) {
        self.extents[index] = 0;
    }

    /// Forget everything written to every arena. Bytes stay in place.
    pub fn rewind_all(&mut self) {
        self.extents.iter_mut().for_each(|e| *e = 0);
    }

    /// Append a record to arena `index` and return the offset it starts at.
    ///
    /// Returns `None` if the record does not fit in what is left of the arena.
    pub fn append(&mut self, index: usize, key: &[u8], value: &[u8]) -> Option<usize> {
        let len = record::encoded_len(key.len(), value.len())?;
        if len > self.remaining(index) {
            return None;
        }
        let offset = self.extents[index];
        let start = index * self.arena_size + offset;
        record::encode(&mut self.map[start..start + len], key, value);
        self.extents[index] = offset + len;
        Some(offset)
    }

    /// Decode the record at `offset` in arena `index`, bounded by that arena's
    /// written extent.
    #[inline]
    pub fn record(&self, index: usize, offset: usize) -> Option<Record<'_>> {
        let extent = *self.extents.get(index)?;
        let start = index * self.arena_size;
        Record::decode(&self.map[start..start + extent], offset)
    }
}
