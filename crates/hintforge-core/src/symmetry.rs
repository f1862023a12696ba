//! The grid symmetry group.
//!
//! Sudoku structure is preserved by permuting rows within a band, columns
//! within a stack, whole bands, whole stacks, and by transposing the board.
//! Together these generate a group of order 3,359,232 acting on the 81 cells.
//! [`CellPermutation::all`] iterates it; [`CellPermutation::column_group`]
//! iterates the order-2,592 subgroup that leaves the row grouping alone
//! (column, stack, and transpose moves only), which is what the canonicalizer
//! enumerates explicitly.

use crate::{cell_set::CellSet, grid::Puzzle};

/// Number of elements of the full grid symmetry group.
pub const CELL_PERMUTATION_ORDER: usize = 3_359_232;

/// Number of elements of the subgroup fixing the row grouping.
pub const COLUMN_PERMUTATION_ORDER: usize = 2_592;

/// The six permutations of three elements, as swap sequences.
///
/// Index `k` applied to `[0, 1, 2]` yields the `k`-th permutation in the
/// mixed-radix iteration order.
const PERM3S: [&[(usize, usize)]; 6] = [
    &[],
    &[(1, 2)],
    &[(0, 1)],
    &[(0, 1), (1, 2)],
    &[(0, 2), (1, 2)],
    &[(0, 2)],
];

/// Swap sequence turning `PERM3S[k]` into `PERM3S[k + 1]` (wrapping at 6).
const PERM3_DIFFS: [&[(usize, usize)]; 6] = [
    &[(1, 2)],
    &[(0, 1), (0, 2)],
    &[(1, 2)],
    &[(0, 1), (1, 2)],
    &[(1, 2)],
    &[(0, 2)],
];

/// A bijection on the 81 cell positions.
///
/// `get(i)` is the position cell `i` moves to. Compose with [`then`], invert
/// with [`inverse`]; both are exact group operations.
///
/// [`then`]: CellPermutation::then
/// [`inverse`]: CellPermutation::inverse
///
/// # Examples
///
/// ```
/// use hintforge_core::CellPermutation;
///
/// let id = CellPermutation::identity();
/// for g in CellPermutation::column_group().take(10) {
///     assert_eq!(g.then(&g.inverse()), id);
/// }
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CellPermutation([u8; 81]);

impl CellPermutation {
    /// The identity permutation.
    #[must_use]
    pub fn identity() -> Self {
        let mut data = [0; 81];
        for (i, d) in data.iter_mut().enumerate() {
            *d = i as u8;
        }
        Self(data)
    }

    /// Returns the position cell `i` maps to.
    #[must_use]
    pub const fn get(&self, i: usize) -> usize {
        self.0[i] as usize
    }

    /// Composition: applies `self` first, then `other`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        let mut data = [0; 81];
        for (d, &i) in data.iter_mut().zip(&self.0) {
            *d = other.0[i as usize];
        }
        Self(data)
    }

    /// The inverse permutation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut data = [0; 81];
        for i in 0..81 {
            data[self.0[i] as usize] = i as u8;
        }
        Self(data)
    }

    /// Moves every cell of `mask` to its image position.
    #[must_use]
    pub fn apply_to_set(&self, mask: CellSet) -> CellSet {
        mask.iter().map(|cell| self.get(cell)).collect()
    }

    /// Moves every cell of `puzzle` to its image position, keeping digits.
    #[must_use]
    pub fn apply_to_puzzle(&self, puzzle: &Puzzle) -> Puzzle {
        let mut cells = [0; 81];
        for i in 0..81 {
            cells[self.get(i)] = puzzle.digit(i);
        }
        Puzzle::from_cells(cells)
    }

    /// Iterates the full symmetry group, each element exactly once.
    #[must_use]
    pub fn all() -> CellPermutations {
        CellPermutations::new(0)
    }

    /// Iterates the subgroup that fixes the row grouping.
    ///
    /// Column-within-stack, stack, and transpose moves only.
    #[must_use]
    pub fn column_group() -> CellPermutations {
        CellPermutations::new(4)
    }

    /// Pre-composes with the swap of rows `row1` and `row2`.
    pub(crate) fn swap_rows(&mut self, row1: usize, row2: usize) {
        let (a, b) = (row1 * 9, row2 * 9);
        for j in 0..9 {
            self.0.swap(a + j, b + j);
        }
    }

    /// Pre-composes with the swap of columns `col1` and `col2`.
    pub(crate) fn swap_columns(&mut self, col1: usize, col2: usize) {
        for j in 0..9 {
            self.0.swap(j * 9 + col1, j * 9 + col2);
        }
    }

    /// Pre-composes with the swap of bands `band1` and `band2`.
    pub(crate) fn swap_bands(&mut self, band1: usize, band2: usize) {
        let (a, b) = (band1 * 27, band2 * 27);
        for j in 0..27 {
            self.0.swap(a + j, b + j);
        }
    }

    /// Pre-composes with the swap of stacks `stack1` and `stack2`.
    pub(crate) fn swap_stacks(&mut self, stack1: usize, stack2: usize) {
        let (a, b) = (stack1 * 3, stack2 * 3);
        for j in 0..9 {
            for k in 0..3 {
                self.0.swap(j * 9 + a + k, j * 9 + b + k);
            }
        }
    }

    /// Pre-composes with the board transposition.
    pub(crate) fn transpose(&mut self) {
        for i in 0..9 {
            for j in 0..i {
                self.0.swap(i * 9 + j, j * 9 + i);
            }
        }
    }

    fn apply_row_perm3(&mut self, band: usize, swaps: &[(usize, usize)]) {
        for &(a, b) in swaps {
            self.swap_rows(band * 3 + a, band * 3 + b);
        }
    }

    fn apply_column_perm3(&mut self, stack: usize, swaps: &[(usize, usize)]) {
        for &(a, b) in swaps {
            self.swap_columns(stack * 3 + a, stack * 3 + b);
        }
    }

    fn apply_band_perm3(&mut self, swaps: &[(usize, usize)]) {
        for &(a, b) in swaps {
            self.swap_bands(a, b);
        }
    }

    fn apply_stack_perm3(&mut self, swaps: &[(usize, usize)]) {
        for &(a, b) in swaps {
            self.swap_stacks(a, b);
        }
    }
}

/// Iterator over a symmetry (sub)group as a mixed-radix counter.
///
/// Digits 0..=2 select the row permutation of each band, digit 3 the band
/// permutation, digits 4..=6 the column permutation of each stack, digit 7
/// the stack permutation, digit 8 the transpose. Counting starts at
/// `lo_index` so the column subgroup simply skips the row/band digits.
/// When only the innermost digits change the permutation is updated
/// incrementally from the previous one; a carry past the row digits triggers
/// a full rebuild.
#[derive(Clone, Debug)]
pub struct CellPermutations {
    digits: [u8; 10],
    inv: CellPermutation,
    current: CellPermutation,
    lo_index: usize,
}

impl CellPermutations {
    fn new(lo_index: usize) -> Self {
        Self {
            digits: [0; 10],
            inv: CellPermutation::identity(),
            current: CellPermutation::identity(),
            lo_index,
        }
    }

    /// Bumps the counter, returning the highest digit position that changed.
    fn increment(&mut self) -> usize {
        for i in self.lo_index..8 {
            self.digits[i] += 1;
            if self.digits[i] < 6 {
                return i;
            }
            self.digits[i] = 0;
        }
        if self.lo_index <= 8 {
            self.digits[8] += 1;
            if self.digits[8] < 2 {
                return 8;
            }
            self.digits[8] = 0;
        }
        self.digits[9] += 1;
        9
    }

    fn rebuild(&mut self) {
        self.inv = CellPermutation::identity();

        if self.digits[8] != 0 {
            self.inv.transpose();
        }

        self.inv.apply_stack_perm3(PERM3S[self.digits[7] as usize]);
        for stack in 0..3 {
            self.inv.apply_column_perm3(stack, PERM3S[self.digits[4 + stack] as usize]);
        }

        if self.lo_index < 4 {
            self.inv.apply_band_perm3(PERM3S[self.digits[3] as usize]);
            for band in 0..3 {
                self.inv.apply_row_perm3(band, PERM3S[self.digits[band] as usize]);
            }
        }

        self.current = self.inv.inverse();
    }

    fn advance(&mut self) {
        let i = self.increment();
        if i <= 2 {
            for band in 0..i {
                self.inv.apply_row_perm3(band, PERM3_DIFFS[5]);
            }
            self.inv.apply_row_perm3(i, PERM3_DIFFS[self.digits[i] as usize - 1]);
            self.current = self.inv.inverse();
        } else if i < 9 {
            self.rebuild();
        }
    }
}

impl Iterator for CellPermutations {
    type Item = CellPermutation;

    fn next(&mut self) -> Option<CellPermutation> {
        if self.digits[9] != 0 {
            return None;
        }
        let result = self.current;
        self.advance();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_identity_and_inverse() {
        let id = CellPermutation::identity();
        assert_eq!(id.then(&id), id);
        for g in CellPermutation::column_group() {
            assert_eq!(g.then(&g.inverse()), id);
            assert_eq!(g.inverse().then(&g), id);
        }
    }

    #[test]
    fn test_composition_associates_on_masks() {
        let mask = CellSet::from_iter([0, 4, 13, 27, 55, 77]);
        let mut perms = CellPermutation::column_group();
        let a = perms.nth(17).unwrap();
        let b = perms.nth(101).unwrap();
        assert_eq!(
            a.then(&b).apply_to_set(mask),
            b.apply_to_set(a.apply_to_set(mask))
        );
    }

    #[test]
    fn test_column_group_is_distinct_and_complete() {
        let seen: HashSet<_> = CellPermutation::column_group().collect();
        assert_eq!(seen.len(), COLUMN_PERMUTATION_ORDER);
    }

    #[test]
    fn test_column_group_fixes_row_grouping() {
        // Without row or band moves, a whole row lands on a single row, or
        // on a single column when the element transposes.
        for g in CellPermutation::column_group() {
            for row in 0..9 {
                let images: Vec<_> = (0..9).map(|col| g.get(row * 9 + col)).collect();
                let same_row = images.iter().all(|&p| p / 9 == images[0] / 9);
                let same_col = images.iter().all(|&p| p % 9 == images[0] % 9);
                assert!(same_row || same_col);
            }
        }
    }

    #[test]
    fn test_full_group_order() {
        assert_eq!(CellPermutation::all().count(), CELL_PERMUTATION_ORDER);
    }

    #[test]
    fn test_incremental_update_matches_rebuild() {
        // Cross several row-digit carries; every incrementally updated state
        // must match a full rebuild from the same counter digits.
        let mut iter = CellPermutations::new(0);
        for _ in 0..2000 {
            iter.advance();
            if iter.digits[9] != 0 {
                break;
            }
            let mut check = iter.clone();
            check.rebuild();
            assert_eq!(iter.current, check.current);
            assert_eq!(iter.inv, check.inv);
        }
    }
}
