//! Seed lists, seed counters and per-tile flags
//!
//! These are the device-resident scratch buffers of one reconstruction.
//! Blocks append to a [`SeedList`] by reserving a contiguous region on the
//! [`SeedCounter`] with a single atomic add, then copying their block-local
//! buffer into it.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Coordinate of a pixel that needs to be re-examined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed {
    pub x: u32,
    pub y: u32,
}

impl Seed {
    #[inline]
    pub fn new(x: u32, y: u32) -> Self {
        Seed { x, y }
    }

    #[inline]
    fn pack(self) -> u64 {
        ((self.y as u64) << 32) | self.x as u64
    }

    #[inline]
    fn unpack(bits: u64) -> Self {
        Seed {
            x: bits as u32,
            y: (bits >> 32) as u32,
        }
    }
}

/// Capacity a seed list should grow to.
///
/// Grows to `max(required, live * 8, 2 * capacity)` so that repeated small
/// shortfalls do not reallocate every round.
pub fn grown_capacity(capacity: usize, live: usize, required: usize) -> usize {
    required.max(live.saturating_mul(8)).max(capacity.saturating_mul(2))
}

/// Fixed-capacity array of seeds in device memory
#[derive(Debug, Default)]
pub struct SeedList {
    slots: Vec<AtomicU64>,
}

impl SeedList {
    pub fn with_capacity(capacity: usize) -> Self {
        SeedList {
            slots: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Read entry `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    pub fn read(&self, index: usize) -> Seed {
        Seed::unpack(self.slots[index].load(Ordering::Relaxed))
    }

    /// Write entry `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    pub fn write(&self, index: usize, seed: Seed) {
        self.slots[index].store(seed.pack(), Ordering::Relaxed);
    }

    /// Make room for at least `required` entries.
    ///
    /// Reallocation discards the contents; callers only grow the list that
    /// the next launch is about to fill. Returns true if the list grew.
    pub fn ensure_capacity(&mut self, required: usize, live: usize) -> bool {
        if self.capacity() >= required {
            return false;
        }
        *self = SeedList::with_capacity(grown_capacity(self.capacity(), live, required));
        true
    }

    /// Copy the first `count` entries out, for inspection on the host.
    pub fn read_back(&self, count: usize) -> Vec<Seed> {
        (0..count.min(self.capacity())).map(|i| self.read(i)).collect()
    }
}

/// Counter of entries appended to a seed list during one launch
///
/// A reservation that would run past the list's capacity is refused and
/// latches the overflow flag; the entries are dropped, never written out of
/// bounds.
#[derive(Debug, Default)]
pub struct SeedCounter {
    count: AtomicUsize,
    overflowed: AtomicBool,
}

impl SeedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset before a launch.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.overflowed.store(false, Ordering::Relaxed);
    }

    /// Reserve `n` entries; returns the start of the reserved region.
    #[inline]
    pub fn reserve(&self, n: usize) -> usize {
        self.count.fetch_add(n, Ordering::AcqRel)
    }

    /// Host read-back of the number of appended entries.
    pub fn read_back(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn mark_overflow(&self) {
        self.overflowed.store(true, Ordering::Release);
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }
}

/// Append a block's buffered seeds to `list`.
///
/// One atomic add on the counter per block; the block then copies its
/// buffer into the reserved region if it fits.
pub fn append_block(list: &SeedList, counter: &SeedCounter, local: &[Seed]) {
    if local.is_empty() {
        return;
    }
    let start = counter.reserve(local.len());
    if start + local.len() > list.capacity() {
        counter.mark_overflow();
        return;
    }
    for (i, &seed) in local.iter().enumerate() {
        list.write(start + i, seed);
    }
}

/// One "modified" counter per tile of a bulk pass
#[derive(Debug)]
pub struct TileFlags {
    flags: Vec<AtomicU32>,
}

impl TileFlags {
    pub fn new(tiles: usize) -> Self {
        TileFlags {
            flags: (0..tiles).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[inline]
    pub fn set(&self, tile: usize, changed: u32) {
        self.flags[tile].store(changed, Ordering::Relaxed);
    }

    /// Host-side sum of all tiles' counts.
    pub fn sum(&self) -> usize {
        self.flags
            .iter()
            .map(|f| f.load(Ordering::Relaxed) as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_list_read_write() {
        let list = SeedList::with_capacity(4);
        list.write(2, Seed::new(7, u32::MAX));
        assert_eq!(list.read(2), Seed::new(7, u32::MAX));
        assert_eq!(list.capacity(), 4);
    }

    #[test]
    fn test_grow_policy() {
        assert_eq!(grown_capacity(100, 10, 150), 200);
        assert_eq!(grown_capacity(100, 50, 150), 400);
        assert_eq!(grown_capacity(0, 0, 150), 150);

        let mut list = SeedList::with_capacity(16);
        assert!(!list.ensure_capacity(16, 2));
        assert!(list.ensure_capacity(17, 2));
        assert_eq!(list.capacity(), 32);
    }

    #[test]
    fn test_append_block_reserves_disjoint_regions() {
        let list = SeedList::with_capacity(8);
        let counter = SeedCounter::new();
        append_block(&list, &counter, &[Seed::new(0, 0), Seed::new(1, 0)]);
        append_block(&list, &counter, &[Seed::new(2, 0)]);
        assert_eq!(counter.read_back(), 3);
        assert!(!counter.overflowed());
        assert_eq!(
            list.read_back(3),
            vec![Seed::new(0, 0), Seed::new(1, 0), Seed::new(2, 0)]
        );
    }

    #[test]
    fn test_append_block_refuses_overflow() {
        let list = SeedList::with_capacity(2);
        let counter = SeedCounter::new();
        append_block(&list, &counter, &[Seed::new(5, 5); 3]);
        assert!(counter.overflowed());
        assert_eq!(list.read(0), Seed::new(0, 0));

        counter.reset();
        assert_eq!(counter.read_back(), 0);
        assert!(!counter.overflowed());
    }

    #[test]
    fn test_tile_flags_sum() {
        let flags = TileFlags::new(3);
        flags.set(0, 2);
        flags.set(2, 5);
        assert_eq!(flags.sum(), 7);
        flags.set(2, 0);
        assert_eq!(flags.sum(), 2);
    }
}
