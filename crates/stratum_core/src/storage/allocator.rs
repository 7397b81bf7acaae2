//! # Slot Allocator
//!
//! Hands out stable `u16` slot indices from a 65536-bit occupancy bitset.
//!
//! ```text
//! sections: [FULL][FULL][0b..0111][....][....] ... (1024 x u64)
//!                        ^
//!                        search_cursor
//! ```
//!
//! Every section below `search_cursor` is completely occupied and the section
//! at the cursor (if any) still has a free bit. `find_free_index` therefore
//! always yields the *lowest* free index in O(1).

/// Total number of slots managed by one allocator.
pub const SLOT_COUNT: usize = u16::MAX as usize + 1;

const SECTION_BITS: usize = u64::BITS as usize;
const SECTION_COUNT: usize = SLOT_COUNT / SECTION_BITS;
const SECTION_FULL: u64 = u64::MAX;

/// Occupancy bitset over the full `u16` index space.
///
/// Indices are `u16`, so every representable index is in range.
pub struct SlotAllocator {
    /// 1 = occupied, 0 = free. 64 slots per section.
    sections: Box<[u64]>,
    /// Lowest section that still contains a free bit.
    search_cursor: usize,
    /// Number of occupied slots.
    count: u32,
}

impl SlotAllocator {
    /// Creates an allocator with every slot free.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: vec![0u64; SECTION_COUNT].into_boxed_slice(),
            search_cursor: 0,
            count: 0,
        }
    }

    #[inline]
    const fn locate(index: u16) -> (usize, u64) {
        let index = index as usize;
        (index / SECTION_BITS, 1u64 << (index % SECTION_BITS))
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Returns `true` once every slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.search_cursor == self.sections.len()
    }

    /// Returns the lowest free index, or `None` when full.
    ///
    /// Does not reserve the slot; follow up with `set(index, true)`.
    #[inline]
    #[must_use]
    pub fn find_free_index(&self) -> Option<u16> {
        let section = *self.sections.get(self.search_cursor)?;
        debug_assert_ne!(section, SECTION_FULL, "cursor parked on a full section");

        let bit = (!section).trailing_zeros() as usize;
        let index = self.search_cursor * SECTION_BITS + bit;
        // cursor < 1024, bit < 64
        #[allow(clippy::cast_possible_truncation)]
        Some(index as u16)
    }

    /// Returns whether `index` is occupied.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u16) -> bool {
        let (section, mask) = Self::locate(index);
        self.sections[section] & mask != 0
    }

    /// Marks `index` occupied (`true`) or free (`false`).
    ///
    /// Setting a bit to its current value is a no-op.
    pub fn set(&mut self, index: u16, value: bool) {
        let (section_idx, mask) = Self::locate(index);
        let section = &mut self.sections[section_idx];

        if (*section & mask != 0) == value {
            return;
        }

        if value {
            *section |= mask;
            self.count += 1;

            if section_idx == self.search_cursor && *section == SECTION_FULL {
                self.advance_cursor();
            }
        } else {
            *section &= !mask;
            self.count -= 1;

            if section_idx < self.search_cursor {
                self.search_cursor = section_idx;
            }
        }
    }

    /// Finds, reserves and returns the lowest free index.
    #[inline]
    pub fn allocate(&mut self) -> Option<u16> {
        let index = self.find_free_index()?;
        self.set(index, true);
        Some(index)
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        self.sections.fill(0);
        self.search_cursor = 0;
        self.count = 0;
    }

    /// Iterates occupied indices, lowest first.
    pub fn iter_occupied(&self) -> impl Iterator<Item = u16> + '_ {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, &section)| section != 0)
            .flat_map(|(section_idx, &section)| {
                let base = section_idx * SECTION_BITS;
                let mut bits = section;
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let bit = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    #[allow(clippy::cast_possible_truncation)]
                    Some((base + bit) as u16)
                })
            })
    }

    /// Skips the cursor past every full section.
    fn advance_cursor(&mut self) {
        while self
            .sections
            .get(self.search_cursor)
            .is_some_and(|&section| section == SECTION_FULL)
        {
            self.search_cursor += 1;
        }
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SlotAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotAllocator")
            .field("count", &self.count)
            .field("search_cursor", &self.search_cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn linear_count(allocator: &SlotAllocator) -> u32 {
        (0..=u16::MAX).map(|i| u32::from(allocator.get(i))).sum()
    }

    #[test]
    fn test_lowest_free_index() {
        let mut allocator = SlotAllocator::new();
        assert_eq!(allocator.find_free_index(), Some(0));

        for expected in 0..10u16 {
            assert_eq!(allocator.allocate(), Some(expected));
        }
        assert_eq!(allocator.count(), 10);

        allocator.set(3, false);
        allocator.set(7, false);
        assert_eq!(allocator.find_free_index(), Some(3));
        assert_eq!(allocator.allocate(), Some(3));
        assert_eq!(allocator.allocate(), Some(7));
        assert_eq!(allocator.allocate(), Some(10));
    }

    #[test]
    fn test_cursor_skips_full_sections() {
        let mut allocator = SlotAllocator::new();
        for _ in 0..64 {
            allocator.allocate();
        }
        assert_eq!(allocator.search_cursor, 1);
        assert_eq!(allocator.find_free_index(), Some(64));

        // Pre-fill section 2, then fill section 1: cursor must skip both.
        for i in 128..192u16 {
            allocator.set(i, true);
        }
        assert_eq!(allocator.search_cursor, 1);
        for _ in 64..128 {
            allocator.allocate();
        }
        assert_eq!(allocator.search_cursor, 3);
        assert_eq!(allocator.find_free_index(), Some(192));
    }

    #[test]
    fn test_free_retreats_cursor() {
        let mut allocator = SlotAllocator::new();
        for _ in 0..200 {
            allocator.allocate();
        }
        allocator.set(5, false);
        assert_eq!(allocator.search_cursor, 0);
        assert_eq!(allocator.find_free_index(), Some(5));
    }

    #[test]
    fn test_redundant_set_is_noop() {
        let mut allocator = SlotAllocator::new();
        allocator.set(42, true);
        allocator.set(42, true);
        assert_eq!(allocator.count(), 1);
        allocator.set(42, false);
        allocator.set(42, false);
        assert_eq!(allocator.count(), 0);
    }

    #[test]
    fn test_fill_to_capacity() {
        let mut allocator = SlotAllocator::new();
        for expected in 0..=u16::MAX {
            assert!(!allocator.is_full());
            assert_eq!(allocator.allocate(), Some(expected));
        }
        assert!(allocator.is_full());
        assert_eq!(allocator.count() as usize, SLOT_COUNT);
        assert_eq!(allocator.find_free_index(), None);

        allocator.set(u16::MAX, false);
        assert!(!allocator.is_full());
        assert_eq!(allocator.find_free_index(), Some(u16::MAX));
    }

    #[test]
    fn test_random_churn_matches_linear_scan() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        let mut allocator = SlotAllocator::new();
        let mut live: Vec<u16> = Vec::new();

        for _ in 0..20_000 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let index = allocator.find_free_index().unwrap();
                assert!(!allocator.get(index), "returned an occupied index");
                allocator.set(index, true);
                live.push(index);
            } else {
                let victim = live.swap_remove(rng.gen_range(0..live.len()));
                allocator.set(victim, false);
            }
        }

        assert_eq!(allocator.count(), linear_count(&allocator));
        assert_eq!(allocator.count() as usize, live.len());

        let lowest_free = (0..=u16::MAX).find(|&i| !allocator.get(i));
        assert_eq!(allocator.find_free_index(), lowest_free);
        assert!(!allocator.is_full());
    }

    #[test]
    fn test_iter_occupied() {
        let mut allocator = SlotAllocator::new();
        for index in [900u16, 2, 65, 64, u16::MAX] {
            allocator.set(index, true);
        }
        let occupied: Vec<u16> = allocator.iter_occupied().collect();
        assert_eq!(occupied, vec![2, 64, 65, 900, u16::MAX]);

        allocator.clear();
        assert_eq!(allocator.iter_occupied().count(), 0);
        assert_eq!(allocator.find_free_index(), Some(0));
    }
}
