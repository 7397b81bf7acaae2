//! # 256-bit Mask
//!
//! Fixed-size bit set addressed by a single byte. Used as the archetype
//! membership mask behind [`ArchetypeFilter`](crate::ArchetypeFilter).
//!
//! ```text
//! bit:   0 ........ 63 | 64 ...... 127 | 128 ..... 191 | 192 ..... 255
//! word:  [     0      ] [      1      ] [      2      ] [      3      ]
//! ```

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Number of 64-bit words backing the mask.
const WORD_COUNT: usize = 4;

/// Bits per backing word.
const WORD_BITS: usize = u64::BITS as usize;

/// A 256-bit set with O(1) test, set, popcount and word-wise AND/OR.
///
/// Value type: copies on assignment, equality compares all four words.
/// Indices are `u8`, so every representable index is in range.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitMask256 {
    words: [u64; WORD_COUNT],
}

impl BitMask256 {
    /// Total number of addressable bits.
    pub const BITS: usize = WORD_COUNT * WORD_BITS;

    /// The empty mask.
    pub const EMPTY: Self = Self { words: [0; WORD_COUNT] };

    /// The mask with every bit set.
    pub const FULL: Self = Self {
        words: [u64::MAX; WORD_COUNT],
    };

    /// Creates an empty mask.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    #[inline]
    const fn locate(index: u8) -> (usize, u64) {
        let index = index as usize;
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    /// Returns whether bit `index` is set.
    #[inline]
    #[must_use]
    pub const fn get(&self, index: u8) -> bool {
        let (word, mask) = Self::locate(index);
        self.words[word] & mask != 0
    }

    /// Sets or clears bit `index`.
    #[inline]
    pub fn set(&mut self, index: u8, value: bool) {
        let (word, mask) = Self::locate(index);
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
    }

    /// Population count across all four words.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.words[0].count_ones()
            + self.words[1].count_ones()
            + self.words[2].count_ones()
            + self.words[3].count_ones()
    }

    /// Returns `true` if all 256 bits are set.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Sets every bit to `value`.
    #[inline]
    pub fn clear(&mut self, value: bool) {
        self.words = if value { Self::FULL.words } else { Self::EMPTY.words };
    }

    /// Word-wise AND. Operands are left untouched.
    #[inline]
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let mut words = self.words;
        for (word, rhs) in words.iter_mut().zip(other.words) {
            *word &= rhs;
        }
        Self { words }
    }

    /// Word-wise OR. Operands are left untouched.
    #[inline]
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        let mut words = self.words;
        for (word, rhs) in words.iter_mut().zip(other.words) {
            *word |= rhs;
        }
        Self { words }
    }

    /// Iterates set bit indices, lowest first. The iterator owns a copy of
    /// the mask.
    pub fn iter_ones(&self) -> impl Iterator<Item = u8> {
        self.words
            .into_iter()
            .enumerate()
            .flat_map(|(word_idx, word)| SetBits {
                base: word_idx * WORD_BITS,
                word,
            })
    }
}

/// Walks the set bits of one word using `trailing_zeros`.
struct SetBits {
    base: usize,
    word: u64,
}

impl Iterator for SetBits {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        // base + bit < 256
        #[allow(clippy::cast_possible_truncation)]
        Some((self.base + bit) as u8)
    }
}

impl BitAnd for BitMask256 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.and(&rhs)
    }
}

impl BitAndAssign for BitMask256 {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        *self = self.and(&rhs);
    }
}

impl BitOr for BitMask256 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.or(&rhs)
    }
}

impl BitOrAssign for BitMask256 {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.or(&rhs);
    }
}

impl fmt::Debug for BitMask256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_ones()).finish()
    }
}

/// Renders all 256 bits as `0`/`1`, bit 0 first.
impl fmt::Display for BitMask256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..=u8::MAX {
            f.write_str(if self.get(index) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_of(bits: &[u8]) -> BitMask256 {
        let mut mask = BitMask256::new();
        for &bit in bits {
            mask.set(bit, true);
        }
        mask
    }

    #[test]
    fn test_get_set_across_words() {
        let mut mask = BitMask256::new();
        for bit in [0u8, 63, 64, 127, 128, 191, 192, 255] {
            assert!(!mask.get(bit));
            mask.set(bit, true);
            assert!(mask.get(bit));
        }
        assert_eq!(mask.count(), 8);

        mask.set(64, false);
        assert!(!mask.get(64));
        assert!(mask.get(63));
        assert!(mask.get(127));
        assert_eq!(mask.count(), 7);
    }

    #[test]
    fn test_clear_and_full() {
        let mut mask = BitMask256::new();
        assert!(mask.is_empty());
        assert!(!mask.is_full());

        mask.clear(true);
        assert!(mask.is_full());
        assert_eq!(mask.count(), 256);

        mask.set(200, false);
        assert!(!mask.is_full());

        mask.clear(false);
        assert!(mask.is_empty());
        assert_eq!(mask, BitMask256::EMPTY);
    }

    #[test]
    fn test_and_or_laws() {
        let a = mask_of(&[1, 5, 64, 130, 255]);
        let b = mask_of(&[5, 64, 200]);
        let c = mask_of(&[0, 5, 200, 255]);

        let ab = a & b;
        assert_eq!(ab, mask_of(&[5, 64]));
        assert!(ab.count() <= a.count().min(b.count()));

        assert_eq!(a & b, b & a);
        assert_eq!((a & b) & c, a & (b & c));
        assert_eq!(a | b, b | a);
        assert_eq!((a | b) | c, a | (b | c));
        assert_eq!(a | a, a);
        assert_eq!(a & a, a);

        // Operands unchanged.
        assert_eq!(a, mask_of(&[1, 5, 64, 130, 255]));
    }

    #[test]
    fn test_iter_ones_is_ordered() {
        let mask = mask_of(&[255, 3, 64, 0, 190]);
        let bits: Vec<u8> = mask.iter_ones().collect();
        assert_eq!(bits, vec![0, 3, 64, 190, 255]);
    }

    #[test]
    fn test_display_renders_every_bit() {
        let text = mask_of(&[0, 2]).to_string();
        assert_eq!(text.len(), 256);
        assert!(text.starts_with("101"));
        assert!(text[3..].chars().all(|c| c == '0'));
    }
}
