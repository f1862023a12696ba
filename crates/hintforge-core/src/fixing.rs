//! Symmetries that fix a hint pattern.
//!
//! A symmetry mapping a hint mask onto itself permutes the hint cells among
//! themselves. This module enumerates those induced permutations, written
//! over hint *indices* (the position of each cell in the mask's ascending
//! order) so downstream consumers can relabel per-hint data without touching
//! cell coordinates. Patterns are limited to [`MAX_HINT_COUNT`] hints by the
//! fixed-width index representation; more hints abort.

use std::collections::HashSet;

use crate::{
    cell_set::CellSet,
    rows::{BandRows, RowView},
    symmetry::CellPermutation,
};

/// Upper bound on hints in a pattern handled by this enumeration.
pub const MAX_HINT_COUNT: usize = 32;

/// The six permutations of three elements in one-line notation.
const PERM3S: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// A permutation of hint indices `0..n`; unused slots hold `u8::MAX`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct HintPermutation {
    perm: [u8; MAX_HINT_COUNT],
}

impl HintPermutation {
    /// Returns the image of hint index `i`.
    #[must_use]
    pub const fn get(&self, i: usize) -> usize {
        self.perm[i] as usize
    }
}

/// Result of a fixing-symmetry enumeration.
#[derive(Clone, Debug)]
pub struct FixingSymmetries {
    /// Distinct hint-index permutations, sorted.
    pub permutations: Vec<HintPermutation>,
    /// `true` if distinct grid symmetries induced the same hint permutation.
    pub degenerate: bool,
}

/// Enumerates every hint-index permutation induced by a symmetry that maps
/// `mask` onto itself.
///
/// # Panics
///
/// Panics if `mask` has more than [`MAX_HINT_COUNT`] cells.
#[must_use]
pub fn enumerate_fixing_symmetries(mask: CellSet) -> FixingSymmetries {
    let hint_poses: Vec<usize> = mask.iter().collect();
    let num_hints = hint_poses.len();
    assert!(
        num_hints <= MAX_HINT_COUNT,
        "hint count {num_hints} exceeds the limit of {MAX_HINT_COUNT}"
    );

    let mut pos_index = [usize::MAX; 81];
    for (i, &pos) in hint_poses.iter().enumerate() {
        pos_index[pos] = i;
    }

    let original_rows = RowView::from_set(mask);
    let mut canonical_original = original_rows;
    canonical_original.canonicalize();
    let original_bands: [BandRows; 3] = std::array::from_fn(|i| original_rows.band(i));
    let canonical_original_bands: [BandRows; 3] = std::array::from_fn(|i| {
        let mut band = original_bands[i];
        band.canonicalize();
        band
    });

    let empty_band = BandRows::default();
    let mut perm_set = HashSet::new();
    let mut degenerate = false;

    for column_perm in CellPermutation::column_group() {
        let permuted_mask = column_perm.apply_to_set(mask);
        let rows = RowView::from_set(permuted_mask);
        let mut canonical = rows;
        canonical.canonicalize();
        if canonical != canonical_original {
            continue;
        }
        let bands: [BandRows; 3] = std::array::from_fn(|i| rows.band(i));

        for band_perm in &PERM3S {
            let mut row_perm_possibilities = [0u32; 3];
            let mut matched = true;
            for band in 0..3 {
                let mut canonical_band = bands[band];
                canonical_band.canonicalize();
                if canonical_band != canonical_original_bands[band_perm[band]] {
                    matched = false;
                    break;
                }
                let a = &bands[band];
                let b = &original_bands[band_perm[band]];
                let is_empty_band = *a == empty_band;
                for (row_perm_index, row_perm) in PERM3S.iter().enumerate() {
                    if is_empty_band && row_perm_index != 0 {
                        continue;
                    }
                    if (0..3).all(|i| a.rows[i] == b.rows[row_perm[i]]) {
                        row_perm_possibilities[band] |= 1 << row_perm_index;
                    }
                }
                debug_assert!(row_perm_possibilities[band] != 0);
            }
            if !matched {
                continue;
            }

            for_each_bit(row_perm_possibilities[0], |i0| {
                for_each_bit(row_perm_possibilities[1], |i1| {
                    for_each_bit(row_perm_possibilities[2], |i2| {
                        let row_perms = [&PERM3S[i0], &PERM3S[i1], &PERM3S[i2]];
                        let mut hint_perm = HintPermutation { perm: [u8::MAX; MAX_HINT_COUNT] };
                        for (original_index, &original_pos) in hint_poses.iter().enumerate() {
                            let pos = column_perm.get(original_pos);
                            let (row, col) = (pos / 9, pos % 9);
                            let (band, row_index) = (row / 3, row % 3);
                            let new_band = band_perm[band];
                            let new_row = new_band * 3 + row_perms[band][row_index];
                            let new_pos = new_row * 9 + col;
                            let new_index = pos_index[new_pos];
                            debug_assert!(new_index != usize::MAX);
                            hint_perm.perm[original_index] = new_index as u8;
                        }
                        if !perm_set.insert(hint_perm) {
                            degenerate = true;
                        }
                    });
                });
            });
        }
    }

    let mut permutations: Vec<_> = perm_set.into_iter().collect();
    permutations.sort_unstable();
    FixingSymmetries { permutations, degenerate }
}

fn for_each_bit(mut bits: u32, mut f: impl FnMut(usize)) {
    while bits != 0 {
        f(bits.trailing_zeros() as usize);
        bits &= bits - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_always_fixing() {
        let mask = CellSet::from_iter([0, 13, 26, 39, 52]);
        let result = enumerate_fixing_symmetries(mask);
        let identity = result
            .permutations
            .iter()
            .any(|p| (0..mask.len()).all(|i| p.get(i) == i));
        assert!(identity);
    }

    #[test]
    fn test_single_cell_has_trivial_action() {
        let result = enumerate_fixing_symmetries(CellSet::from_iter([40]));
        assert_eq!(result.permutations.len(), 1);
        assert_eq!(result.permutations[0].get(0), 0);
    }

    #[test]
    fn test_corner_pattern_realizes_the_square_symmetries() {
        // Corners in one row must land in one row or one column, so the
        // induced permutations are exactly the 8 symmetries of a square.
        let mask = CellSet::from_iter([0, 8, 72, 80]);
        let result = enumerate_fixing_symmetries(mask);
        assert_eq!(result.permutations.len(), 8);
    }

    #[test]
    fn test_permutations_are_bijections() {
        let mask = CellSet::from_iter([0, 8, 72, 80]);
        let result = enumerate_fixing_symmetries(mask);
        for p in &result.permutations {
            let mut seen = [false; MAX_HINT_COUNT];
            for i in 0..mask.len() {
                assert!(!seen[p.get(i)]);
                seen[p.get(i)] = true;
            }
        }
        // The four corners are swapped by transpose and by row/column
        // reversal; more than the identity must appear.
        assert!(result.permutations.len() > 1);
    }

    #[test]
    #[should_panic(expected = "exceeds the limit")]
    fn test_rejects_oversized_patterns() {
        let mask: CellSet = (0..40).collect();
        let _ = enumerate_fixing_symmetries(mask);
    }
}
