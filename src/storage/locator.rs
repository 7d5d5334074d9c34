//! Packed index values and the write cursor they are checked against.
//!
//! A locator is a single `u64`:
//!
//! ```text
//!  63            40 39                                   0
//! ┌────────────────┬──────────────────────────────────────┐
//! │ generation:24  │ position:40 (arena * arena_size + off)│
//! └────────────────┴──────────────────────────────────────┘
//! ```
//!
//! Generations run over `1..=MAX_GENERATION` and skip zero when they wrap.

pub const GENERATION_BITS: u32 = 24;
pub const POSITION_BITS: u32 = 40;

pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;
pub const MAX_POSITION: u64 = (1 << POSITION_BITS) - 1;

/// Where a record was written, and during which generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator(u64);

impl Locator {
    #[inline]
    pub fn new(generation: u32, position: u64) -> Self {
        debug_assert!(generation != 0 && generation <= MAX_GENERATION);
        debug_assert!(position <= MAX_POSITION);
        Locator(((generation as u64) << POSITION_BITS) | position)
    }

    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> POSITION_BITS) as u32
    }

    #[inline]
    pub fn position(self) -> u64 {
        self.0 & MAX_POSITION
    }
}

/// Generation that follows `generation`, wrapping `MAX_GENERATION` to 1.
#[inline]
pub fn next_generation(generation: u32) -> u32 {
    if generation >= MAX_GENERATION {
        1
    } else {
        generation + 1
    }
}

/// A bucket's write position: the arena being filled, the first free byte in
/// it, and the generation the ring is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub generation: u32,
    pub arena: usize,
    pub offset: usize,
}

impl Cursor {
    pub const START: Cursor = Cursor {
        generation: 1,
        arena: 0,
        offset: 0,
    };

    #[inline]
    pub fn position(&self, arena_size: usize) -> u64 {
        (self.arena * arena_size + self.offset) as u64
    }

    /// Split a locator into `(arena, offset)` if the bytes it points at can
    /// not have been overwritten since it was stored.
    ///
    /// Current-generation records live before the cursor. Previous-generation
    /// records survive only in arenas the ring has not re-entered yet. Older
    /// locators are stale.
    #[inline]
    pub fn resolve(&self, locator: Locator, arena_size: usize) -> Option<(usize, usize)> {
        let position = locator.position() as usize;
        let arena = position / arena_size;
        let offset = position % arena_size;

        let live = if locator.generation() == self.generation {
            arena < self.arena || (arena == self.arena && offset < self.offset)
        } else if next_generation(locator.generation()) == self.generation {
            arena > self.arena
        } else {
            false
        };
        live.then_some((arena, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: usize = 1024;

    fn cursor(generation: u32, arena: usize, offset: usize) -> Cursor {
        Cursor {
            generation,
            arena,
            offset,
        }
    }

    #[test]
    fn pack_and_unpack() {
        let loc = Locator::new(MAX_GENERATION, MAX_POSITION);
        assert_eq!(loc.generation(), MAX_GENERATION);
        assert_eq!(loc.position(), MAX_POSITION);

        let loc = Locator::new(7, 3 * ARENA as u64 + 12);
        assert_eq!(loc.generation(), 7);
        assert_eq!(loc.position(), 3 * ARENA as u64 + 12);
    }

    #[test]
    fn generation_wraps_past_zero() {
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(MAX_GENERATION - 1), MAX_GENERATION);
        assert_eq!(next_generation(MAX_GENERATION), 1);
    }

    #[test]
    fn current_generation_lives_before_cursor() {
        let cur = cursor(5, 2, 100);
        let pos = |arena: usize, off: usize| (arena * ARENA + off) as u64;

        assert_eq!(cur.resolve(Locator::new(5, pos(0, 0)), ARENA), Some((0, 0)));
        assert_eq!(cur.resolve(Locator::new(5, pos(1, 900)), ARENA), Some((1, 900)));
        assert_eq!(cur.resolve(Locator::new(5, pos(2, 99)), ARENA), Some((2, 99)));
        assert_eq!(cur.resolve(Locator::new(5, pos(2, 100)), ARENA), None);
        assert_eq!(cur.resolve(Locator::new(5, pos(3, 0)), ARENA), None);
    }

    #[test]
    fn previous_generation_lives_only_in_unvisited_arenas() {
        let cur = cursor(5, 2, 100);
        let pos = |arena: usize, off: usize| (arena * ARENA + off) as u64;

        assert_eq!(cur.resolve(Locator::new(4, pos(3, 0)), ARENA), Some((3, 0)));
        // The ring re-entered arena 2, so everything there from generation 4 is gone,
        // even past the write offset.
        assert_eq!(cur.resolve(Locator::new(4, pos(2, 500)), ARENA), None);
        assert_eq!(cur.resolve(Locator::new(4, pos(0, 0)), ARENA), None);
    }

    #[test]
    fn two_generations_back_is_stale() {
        let cur = cursor(5, 0, 0);
        assert_eq!(cur.resolve(Locator::new(3, 10 * ARENA as u64), ARENA), None);
        assert_eq!(cur.resolve(Locator::new(6, 0), ARENA), None);
    }

    #[test]
    fn previous_generation_across_counter_wrap() {
        let cur = cursor(1, 0, 10);
        let loc = Locator::new(MAX_GENERATION, 4 * ARENA as u64);
        assert_eq!(cur.resolve(loc, ARENA), Some((4, 0)));
    }
}
