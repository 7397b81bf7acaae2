//! # Archetype Filters
//!
//! A filter is the set of buffer ids whose archetype declares some
//! component. Systems intersect filters to pick the buffers they scan.

use std::ops::{BitAnd, BitAndAssign};

use super::component::Component;
use crate::storage::{BitMask256, ComponentBuffer};

/// Set of buffer ids, bit `i` meaning "buffer `i` matches".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArchetypeFilter {
    mask: BitMask256,
}

impl ArchetypeFilter {
    /// Wraps a raw buffer mask.
    #[inline]
    #[must_use]
    pub const fn new(mask: BitMask256) -> Self {
        Self { mask }
    }

    /// Matches the buffers (by registration index) that declare `C`.
    ///
    /// Buffers past index 255 are not addressable and are ignored.
    #[must_use]
    pub fn for_component<C: Component>(buffers: &[ComponentBuffer]) -> Self {
        let mut mask = BitMask256::new();
        for (id, buffer) in (0..=u8::MAX).zip(buffers) {
            if buffer.has_component::<C>() {
                mask.set(id, true);
            }
        }
        Self { mask }
    }

    /// Underlying mask.
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> BitMask256 {
        self.mask
    }

    /// Returns `true` if buffer `id` matches.
    #[inline]
    #[must_use]
    pub const fn contains(&self, id: u8) -> bool {
        self.mask.get(id)
    }

    /// Buffers matching both filters.
    #[inline]
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            mask: self.mask.and(&other.mask),
        }
    }

    /// Number of matching buffers.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.mask.count()
    }

    /// Returns `true` if no buffer matches.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Matching buffer ids in registration order.
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        self.mask.iter_ones()
    }
}

impl BitAnd for ArchetypeFilter {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.intersect(&rhs)
    }
}

impl BitAndAssign for ArchetypeFilter {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        *self = self.intersect(&rhs);
    }
}

impl From<BitMask256> for ArchetypeFilter {
    fn from(mask: BitMask256) -> Self {
        Self::new(mask)
    }
}
