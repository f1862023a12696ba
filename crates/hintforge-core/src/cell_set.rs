//! An 81-bit set of board cell positions.
//!
//! This module provides [`CellSet`], the fundamental bitset over the 81 cells
//! of a Sudoku board (index = row · 9 + column). It is the currency of the
//! whole workspace: hint masks, unavoidable sets, and the per-digit candidate
//! boards of the uniqueness oracle are all `CellSet`s.
//!
//! # Examples
//!
//! ```
//! use hintforge_core::CellSet;
//!
//! let mut mask = CellSet::EMPTY;
//! mask.insert(0);
//! mask.insert(40);
//! mask.insert(80);
//!
//! assert_eq!(mask.len(), 3);
//! assert!(mask.contains(40));
//! assert_eq!(mask.iter().collect::<Vec<_>>(), vec![0, 40, 80]);
//! ```

use std::{fmt, iter::FusedIterator, str::FromStr};

use crate::grid::ParseGridError;

/// A set of cell positions `0..81`, backed by a single `u128`.
///
/// Bit `i` corresponds to cell `i` (row `i / 9`, column `i % 9`). Only bits
/// `0..81` are ever set; the bitwise operators keep this invariant (in
/// particular `!` masks back down to 81 bits).
///
/// # Examples
///
/// ```
/// use hintforge_core::CellSet;
///
/// let a = CellSet::from_iter([0, 1, 2]);
/// let b = CellSet::from_iter([2, 3]);
///
/// assert_eq!((a & b).len(), 1);
/// assert_eq!((a | b).len(), 4);
/// assert!(b.intersects(a));
/// assert!(!b.is_subset_of(a));
/// assert_eq!((!CellSet::EMPTY), CellSet::FULL);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellSet(u128);

impl CellSet {
    /// The set containing no cells.
    pub const EMPTY: Self = Self(0);

    /// The set containing all 81 cells.
    pub const FULL: Self = Self((1u128 << 81) - 1);

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Adds a cell to the set.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= 81`.
    pub const fn insert(&mut self, cell: usize) {
        assert!(cell < 81);
        self.0 |= 1 << cell;
    }

    /// Removes a cell from the set.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= 81`.
    pub const fn remove(&mut self, cell: usize) {
        assert!(cell < 81);
        self.0 &= !(1 << cell);
    }

    /// Returns `true` if the cell is in the set.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= 81`.
    #[must_use]
    pub const fn contains(self, cell: usize) -> bool {
        assert!(cell < 81);
        self.0 >> cell & 1 != 0
    }

    /// Returns the number of cells in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set contains no cells.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every cell of `self` is also in `other`.
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Returns `true` if the two sets share at least one cell.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns the position of the lowest set bit.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    #[must_use]
    pub const fn first(self) -> usize {
        assert!(self.0 != 0);
        self.0.trailing_zeros() as usize
    }

    /// Removes and returns the lowest cell, or `None` if the set is empty.
    pub const fn pop_first(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let cell = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(cell)
    }

    /// Returns the raw 128-bit word.
    #[must_use]
    pub const fn bits(self) -> u128 {
        self.0
    }

    /// Reconstructs a set from a raw word. Bits above 80 are discarded.
    #[must_use]
    pub const fn from_bits(bits: u128) -> Self {
        Self(bits & Self::FULL.0)
    }

    /// Splits the set into its low and high 64-bit words.
    #[must_use]
    pub const fn to_words(self) -> [u64; 2] {
        [self.0 as u64, (self.0 >> 64) as u64]
    }

    /// Iterates cells in ascending order.
    #[must_use]
    pub const fn iter(self) -> CellIter {
        CellIter(self.0)
    }

    /// Parses an 81-character `'0'`/`'1'` bit string (cell 0 first).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not 81 characters of `0` and `1`.
    pub fn from_bit_string(s: &str) -> Result<Self, ParseGridError> {
        let bytes = s.as_bytes();
        if bytes.len() != 81 {
            return Err(ParseGridError::Length { len: bytes.len() });
        }
        let mut mask = Self::EMPTY;
        for (cell, &b) in bytes.iter().enumerate() {
            match b {
                b'0' => {}
                b'1' => mask.insert(cell),
                _ => return Err(ParseGridError::Character { cell, found: b as char }),
            }
        }
        Ok(mask)
    }

    /// Formats the set as an 81-character `'0'`/`'1'` bit string.
    #[must_use]
    pub fn to_bit_string(self) -> String {
        (0..81).map(|cell| if self.contains(cell) { '1' } else { '0' }).collect()
    }
}

impl FromStr for CellSet {
    type Err = ParseGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bit_string(s)
    }
}

impl fmt::Display for CellSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

impl fmt::Debug for CellSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellSet({})", self.to_bit_string())
    }
}

impl std::ops::BitAnd for CellSet {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for CellSet {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitXor for CellSet {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl std::ops::Not for CellSet {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0 & Self::FULL.0)
    }
}

impl std::ops::BitAndAssign for CellSet {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl std::ops::BitOrAssign for CellSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitXorAssign for CellSet {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl FromIterator<usize> for CellSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut mask = Self::EMPTY;
        for cell in iter {
            mask.insert(cell);
        }
        mask
    }
}

impl IntoIterator for CellSet {
    type Item = usize;
    type IntoIter = CellIter;

    fn into_iter(self) -> CellIter {
        self.iter()
    }
}

/// Iterator over the cells of a [`CellSet`] in ascending order.
#[derive(Debug, Clone)]
pub struct CellIter(u128);

impl Iterator for CellIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let cell = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for CellIter {}
impl FusedIterator for CellIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CellSet::EMPTY.len(), 0);
        assert_eq!(CellSet::FULL.len(), 81);
        for cell in 0..81 {
            assert!(CellSet::FULL.contains(cell));
        }
    }

    #[test]
    fn test_insert_remove() {
        let mut mask = CellSet::new();
        mask.insert(17);
        mask.insert(80);
        assert!(mask.contains(17));
        assert!(mask.contains(80));
        assert_eq!(mask.len(), 2);
        mask.remove(17);
        assert!(!mask.contains(17));
        assert_eq!(mask.len(), 1);
    }

    #[test]
    #[should_panic(expected = "cell < 81")]
    fn test_rejects_out_of_range() {
        let mut mask = CellSet::new();
        mask.insert(81);
    }

    #[test]
    fn test_not_stays_within_board() {
        assert_eq!(!CellSet::EMPTY, CellSet::FULL);
        assert_eq!(!CellSet::FULL, CellSet::EMPTY);
        let single = CellSet::from_iter([40]);
        assert_eq!((!single).len(), 80);
    }

    #[test]
    fn test_iteration_order() {
        let mask = CellSet::from_iter([80, 0, 64, 63, 9]);
        let cells: Vec<_> = mask.iter().collect();
        assert_eq!(cells, vec![0, 9, 63, 64, 80]);
    }

    #[test]
    fn test_subset_and_intersection() {
        let a = CellSet::from_iter([1, 2, 3]);
        let b = CellSet::from_iter([2, 3]);
        assert!(b.is_subset_of(a));
        assert!(!a.is_subset_of(b));
        assert!(a.intersects(b));
        assert!(!a.intersects(CellSet::from_iter([50])));
    }

    #[test]
    fn test_bit_string_round_trip() {
        let mask = CellSet::from_iter([0, 10, 70, 80]);
        let s = mask.to_bit_string();
        assert_eq!(s.len(), 81);
        assert_eq!(CellSet::from_bit_string(&s).unwrap(), mask);
        assert!(CellSet::from_bit_string("01").is_err());
        assert!(CellSet::from_bit_string(&"2".repeat(81)).is_err());
    }

    #[test]
    fn test_pop_first() {
        let mut mask = CellSet::from_iter([5, 66]);
        assert_eq!(mask.pop_first(), Some(5));
        assert_eq!(mask.pop_first(), Some(66));
        assert_eq!(mask.pop_first(), None);
    }
}
