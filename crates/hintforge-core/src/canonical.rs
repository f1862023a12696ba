//! Canonical forms under the grid symmetry group.
//!
//! A [`Canonicalizer`] maps a hint mask, a solved grid, or a partial grid to
//! the lexicographically smallest member of its symmetry orbit, together with
//! the transform that gets there. Only the 2,592 column/stack/transpose
//! permutations are enumerated: the remaining 1,296 row/band permutations are
//! exactly the row/band reorderings of the 9 row patterns, found in O(1)
//! comparisons per coset with a fixed sorting network. Solved and partial
//! grids additionally vary the digit labels; for solved grids each row
//! proposes one relabeling, for partial grids the relabeling is grown during
//! a band-synchronized beam search over row placements.

use crate::{
    cell_set::CellSet,
    grid::{Puzzle, SolvedGrid},
    symmetry::{CellPermutation, COLUMN_PERMUTATION_ORDER},
};

/// All nine column bits of a complemented mask row word.
const ROW_COMPLEMENT_MASK: u16 = (1 << 9) - 1;

/// A cell permutation combined with a digit relabeling.
///
/// Recovered by solution and problem canonicalization, where digit identity
/// varies along with cell positions. `digit_perm[d]` is the zero-based image
/// of digit `d + 1`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridPermutation {
    cell_perm: CellPermutation,
    digit_perm: [u8; 9],
}

impl GridPermutation {
    /// The cell part of the transform.
    #[must_use]
    pub const fn cell_perm(&self) -> &CellPermutation {
        &self.cell_perm
    }

    /// The digit relabeling, zero-based.
    #[must_use]
    pub const fn digit_perm(&self) -> &[u8; 9] {
        &self.digit_perm
    }

    /// Applies the transform to a puzzle: cells move, digits relabel,
    /// blanks stay blank.
    #[must_use]
    pub fn apply_to_puzzle(&self, puzzle: &Puzzle) -> Puzzle {
        let mut cells = [0; 81];
        for i in 0..81 {
            let d = puzzle.digit(i);
            cells[self.cell_perm.get(i)] =
                if d == 0 { 0 } else { self.digit_perm[d as usize - 1] + 1 };
        }
        Puzzle::from_cells(cells)
    }

    /// Applies the transform to a solved grid.
    #[must_use]
    pub fn apply_to_solution(&self, grid: &SolvedGrid) -> SolvedGrid {
        let mut digits = [0; 81];
        for i in 0..81 {
            digits[self.cell_perm.get(i)] = self.digit_perm[grid.digit(i) as usize - 1] + 1;
        }
        SolvedGrid::from_digits(digits)
    }
}

/// Finds lexicographically minimal symmetry representatives.
///
/// Construction materializes the column permutation subgroup once; the
/// canonicalizer is then shared immutably.
///
/// # Examples
///
/// ```
/// use hintforge_core::{Canonicalizer, CellSet};
///
/// let canon = Canonicalizer::new();
/// // Any single cell canonicalizes to the singleton at position 0.
/// let (rep, _) = canon.canonicalize_mask(CellSet::from_iter([57]));
/// assert_eq!(rep, CellSet::from_iter([0]));
/// ```
pub struct Canonicalizer {
    column_perms: Vec<CellPermutation>,
}

impl Canonicalizer {
    /// Builds the canonicalizer, enumerating the column subgroup.
    #[must_use]
    pub fn new() -> Self {
        let column_perms: Vec<_> = CellPermutation::column_group().collect();
        debug_assert_eq!(column_perms.len(), COLUMN_PERMUTATION_ORDER);
        Self { column_perms }
    }

    /// Returns the minimal orbit member of `mask` and the transform that
    /// maps `mask` onto it.
    ///
    /// Orbit members are compared cell by cell with a hint sorting before a
    /// blank, so the representative packs its hints into the earliest cells.
    #[must_use]
    pub fn canonicalize_mask(&self, mask: CellSet) -> (CellSet, CellPermutation) {
        let hint_positions: Vec<usize> = mask.iter().collect();
        let mut lex_min = [u16::MAX; 9];
        let mut res_perm = CellPermutation::identity();
        for perm in &self.column_perms {
            // Row words hold the complement, bit 8 for column 0, so that a
            // hint in an earlier cell makes the word smaller and numeric
            // order matches the mask order.
            let mut rows = [ROW_COMPLEMENT_MASK; 9];
            for &pos in &hint_positions {
                let new_pos = perm.get(pos);
                rows[new_pos / 9] &= !(1 << (8 - new_pos % 9));
            }
            let row_swaps = find_lex_min_row_permutation(&mut rows);
            if rows < lex_min {
                lex_min = rows;
                res_perm = perm.inverse();
                apply_row_swaps(&mut res_perm, row_swaps);
                res_perm = res_perm.inverse();
            }
        }
        let mut lex_min_mask = CellSet::EMPTY;
        for (row, &word) in lex_min.iter().enumerate() {
            let mut bits = !word & ROW_COMPLEMENT_MASK;
            while bits != 0 {
                let col = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                lex_min_mask.insert(row * 9 + (8 - col));
            }
        }
        (lex_min_mask, res_perm)
    }

    /// Returns the minimal orbit member of `solution` under cell moves plus
    /// digit relabeling, and the recovered transform.
    #[must_use]
    pub fn canonicalize_solution(&self, solution: &SolvedGrid) -> (SolvedGrid, GridPermutation) {
        let mut bases = [0u32; 10];
        bases[0] = 1;
        for i in 0..9 {
            bases[i + 1] = bases[i] * 10;
        }
        let mut lex_min = [u32::MAX; 9];
        let mut res_perm = GridPermutation {
            cell_perm: CellPermutation::identity(),
            digit_perm: [0; 9],
        };
        for perm in &self.column_perms {
            // Each target row proposes the relabeling that turns it into
            // "123456789" read left to right.
            let mut digit_perms = [[0u8; 9]; 9];
            for i in 0..81 {
                let new_pos = perm.get(i);
                let (row, col) = (new_pos / 9, new_pos % 9);
                digit_perms[row][solution.digit(i) as usize - 1] = col as u8 + 1;
            }
            for digit_perm in &digit_perms {
                debug_assert!(digit_perm.iter().all(|&d| d != 0));
                let mut rows = [0u32; 9];
                for i in 0..81 {
                    let new_pos = perm.get(i);
                    let (row, col) = (new_pos / 9, new_pos % 9);
                    let d = u32::from(digit_perm[solution.digit(i) as usize - 1]);
                    rows[row] += d * bases[8 - col];
                }
                let row_swaps = find_lex_min_row_permutation(&mut rows);
                if rows < lex_min {
                    lex_min = rows;
                    let mut cell_perm = perm.inverse();
                    apply_row_swaps(&mut cell_perm, row_swaps);
                    res_perm.cell_perm = cell_perm.inverse();
                    for d in 0..9 {
                        res_perm.digit_perm[d] = digit_perm[d] - 1;
                    }
                }
            }
        }
        let mut digits = [0u8; 81];
        for row in 0..9 {
            for col in 0..9 {
                digits[row * 9 + col] = (lex_min[row] / bases[8 - col] % 10) as u8;
            }
        }
        (SolvedGrid::from_digits(digits), res_perm)
    }

    /// Returns the minimal orbit member of `problem` and the recovered
    /// transform.
    ///
    /// Rows are placed one at a time, a band at a time; only the row
    /// orderings tied for the best prefix so far survive each step, each
    /// carrying the digit relabeling forced by its placed hints. Blanks sort
    /// below every digit.
    #[must_use]
    pub fn canonicalize_problem(&self, problem: &Puzzle) -> (Puzzle, GridPermutation) {
        #[derive(Clone)]
        struct State {
            used_rows: u16,
            digit_perm: [u8; 9],
            determined_digits: u8,
            row_order: [u8; 9],
        }

        let mut lex_min = [u32::MAX; 9];
        let mut res_perm = GridPermutation {
            cell_perm: CellPermutation::identity(),
            digit_perm: [0; 9],
        };
        let mut queue: Vec<State> = Vec::new();
        let mut next_queue: Vec<State> = Vec::new();

        for perm in &self.column_perms {
            let mut column_permuted = [[0u8; 9]; 9];
            for i in 0..81 {
                let new_pos = perm.get(i);
                column_permuted[new_pos / 9][new_pos % 9] = problem.digit(i);
            }

            next_queue.clear();
            next_queue.push(State {
                used_rows: 0,
                digit_perm: [0; 9],
                determined_digits: 0,
                row_order: [0; 9],
            });
            for depth in 0..9 {
                std::mem::swap(&mut queue, &mut next_queue);
                next_queue.clear();
                for s in &queue {
                    for row in 0..9 {
                        if s.used_rows >> row & 1 != 0 {
                            continue;
                        }
                        let band = row / 3;
                        let band_used = s.used_rows >> (band * 3) & 7;
                        // Depths 0, 3, 6 open a fresh band; other depths
                        // continue the band just started.
                        let blocked = if depth % 3 == 0 {
                            band_used != 0
                        } else {
                            band_used == 0 || band_used == 7
                        };
                        if blocked {
                            continue;
                        }
                        let mut ns = s.clone();
                        ns.used_rows |= 1 << row;
                        ns.row_order[depth] = row as u8;
                        let mut cur_row = 0u32;
                        for col in 0..9 {
                            let d = column_permuted[row][col];
                            let label = if d == 0 {
                                0
                            } else {
                                let slot = &mut ns.digit_perm[d as usize - 1];
                                if *slot == 0 {
                                    ns.determined_digits += 1;
                                    *slot = ns.determined_digits;
                                }
                                u32::from(*slot)
                            };
                            cur_row = cur_row * 10 + label;
                        }
                        if cur_row < lex_min[depth] {
                            lex_min[depth] = cur_row;
                            for entry in &mut lex_min[depth + 1..] {
                                *entry = u32::MAX;
                            }
                            next_queue.clear();
                            next_queue.push(ns);
                        } else if cur_row == lex_min[depth] {
                            next_queue.push(ns);
                        }
                    }
                }
            }
            if let Some(s) = next_queue.first() {
                let mut cell_perm = perm.inverse();
                let mut row_pos: [u8; 9] = std::array::from_fn(|i| i as u8);
                for i in 0..9 {
                    let row = s.row_order[i] as usize;
                    if row_pos[row] != i as u8 {
                        cell_perm.swap_rows(i, row_pos[row] as usize);
                        let displaced = row_pos[row];
                        let j = row_pos.iter().position(|&p| p == i as u8).unwrap();
                        row_pos[j] = displaced;
                        row_pos[row] = i as u8;
                    }
                }
                res_perm.cell_perm = cell_perm.inverse();
                let mut digits = s.determined_digits;
                for d in 0..9 {
                    let mut label = s.digit_perm[d];
                    if label == 0 {
                        digits += 1;
                        label = digits;
                    }
                    res_perm.digit_perm[d] = label - 1;
                }
            }
        }

        let mut cells = [0u8; 81];
        for row in 0..9 {
            let mut x = lex_min[row];
            for j in 0..9 {
                cells[row * 9 + (8 - j)] = (x % 10) as u8;
                x /= 10;
            }
        }
        (Puzzle::from_cells(cells), res_perm)
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts the 9 row values into their minimal row/band arrangement,
/// returning the applied swaps as a bit pattern for
/// [`apply_row_swaps`].
fn find_lex_min_row_permutation<T: Ord + Copy>(rows: &mut [T; 9]) -> u32 {
    let mut res = 0;
    res |= sort_band(rows, 0);
    res |= sort_band(rows, 3) << 3;
    res |= sort_band(rows, 6) << 6;
    res |= sort_two_bands(rows, 0, 3) << 9;
    res |= sort_two_bands(rows, 3, 6) << 10;
    res |= sort_two_bands(rows, 0, 3) << 11;
    res
}

fn sort_band<T: Ord + Copy>(rows: &mut [T; 9], base: usize) -> u32 {
    let mut res = 0;
    if rows[base + 1] < rows[base] {
        rows.swap(base, base + 1);
        res |= 1;
    }
    if rows[base + 2] < rows[base + 1] {
        rows.swap(base + 1, base + 2);
        res |= 2;
    }
    if rows[base + 1] < rows[base] {
        rows.swap(base, base + 1);
        res |= 4;
    }
    res
}

fn sort_two_bands<T: Ord + Copy>(rows: &mut [T; 9], a: usize, b: usize) -> u32 {
    if rows[b..b + 3] < rows[a..a + 3] {
        for k in 0..3 {
            rows.swap(a + k, b + k);
        }
        1
    } else {
        0
    }
}

/// Replays the swaps recorded by [`find_lex_min_row_permutation`] onto a
/// cell permutation, in recording order.
fn apply_row_swaps(perm: &mut CellPermutation, row_swaps: u32) {
    for band in 0..3 {
        for i in 0..3 {
            if row_swaps >> (band * 3 + i) & 1 != 0 {
                perm.swap_rows(band * 3 + i % 2, band * 3 + i % 2 + 1);
            }
        }
    }
    for i in 0..3 {
        if row_swaps >> (9 + i) & 1 != 0 {
            perm.swap_bands(i % 2, i % 2 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::enumerate_orbit;

    const SOLUTION: &str =
        "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    #[test]
    fn test_mask_idempotent() {
        let canon = Canonicalizer::new();
        let mask = CellSet::from_iter([3, 17, 22, 45, 60, 61, 79]);
        let (rep, _) = canon.canonicalize_mask(mask);
        let (rep2, _) = canon.canonicalize_mask(rep);
        assert_eq!(rep, rep2);
    }

    #[test]
    fn test_mask_orbit_invariance() {
        let canon = Canonicalizer::new();
        let mask = CellSet::from_iter([0, 12, 30, 44]);
        let (rep, _) = canon.canonicalize_mask(mask);
        for image in enumerate_orbit(mask) {
            let (r, _) = canon.canonicalize_mask(image);
            assert_eq!(r, rep);
        }
    }

    #[test]
    fn test_mask_minimality_by_brute_force() {
        let canon = Canonicalizer::new();
        // Small orbit keeps the brute force cheap.
        let mask = CellSet::from_iter([0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let (rep, _) = canon.canonicalize_mask(mask);
        // A hint sorts before a blank, so the orbit minimum has the largest
        // bit string.
        let min = enumerate_orbit(mask)
            .into_iter()
            .max_by_key(|image| image.to_bit_string())
            .unwrap();
        assert_eq!(rep.to_bit_string(), min.to_bit_string());
    }

    #[test]
    fn test_mask_transform_maps_input_to_representative() {
        let canon = Canonicalizer::new();
        let mask = CellSet::from_iter([5, 19, 40, 66, 73]);
        let (rep, perm) = canon.canonicalize_mask(mask);
        assert_eq!(perm.apply_to_set(mask), rep);
    }

    #[test]
    fn test_empty_and_full_masks_are_fixed() {
        let canon = Canonicalizer::new();
        assert_eq!(canon.canonicalize_mask(CellSet::EMPTY).0, CellSet::EMPTY);
        assert_eq!(canon.canonicalize_mask(CellSet::FULL).0, CellSet::FULL);
    }

    #[test]
    fn test_singleton_masks_share_a_representative() {
        let canon = Canonicalizer::new();
        let expected = CellSet::from_iter([0]);
        for cell in 0..81 {
            let (rep, _) = canon.canonicalize_mask(CellSet::from_iter([cell]));
            assert_eq!(rep, expected, "cell {cell}");
        }
    }

    #[test]
    fn test_solution_idempotent_and_transform() {
        let canon = Canonicalizer::new();
        let solution: SolvedGrid = SOLUTION.parse().unwrap();
        let (rep, perm) = canon.canonicalize_solution(&solution);
        assert_eq!(perm.apply_to_solution(&solution), rep);
        let (rep2, _) = canon.canonicalize_solution(&rep);
        assert_eq!(rep, rep2);
        // The canonical first row is forced to read 1..9.
        assert_eq!(&rep.to_string()[..9], "123456789");
    }

    #[test]
    fn test_problem_idempotent_and_transform() {
        let canon = Canonicalizer::new();
        let solution: SolvedGrid = SOLUTION.parse().unwrap();
        let mask = CellSet::from_iter([0, 3, 11, 26, 30, 41, 55, 62, 68, 74, 80]);
        let problem = solution.restrict(mask);
        let (rep, perm) = canon.canonicalize_problem(&problem);
        assert_eq!(perm.apply_to_puzzle(&problem), rep);
        let (rep2, _) = canon.canonicalize_problem(&rep);
        assert_eq!(rep, rep2);
    }

    mod props {
        use std::sync::LazyLock;

        use proptest::prelude::*;

        use super::*;

        static CANON: LazyLock<Canonicalizer> = LazyLock::new(Canonicalizer::new);

        fn arb_mask() -> impl Strategy<Value = CellSet> {
            proptest::collection::vec(0usize..81, 0..16).prop_map(CellSet::from_iter)
        }

        fn arb_transform() -> impl Strategy<Value = CellPermutation> {
            // A short random word over the group generators.
            const PAIRS: [(usize, usize); 3] = [(0, 1), (1, 2), (0, 2)];
            (0usize..9, 0usize..9, 0usize..3, 0usize..3, any::<bool>()).prop_map(
                |(r, c, b, s, t)| {
                    let mut g = CellPermutation::identity();
                    let (a, bb) = PAIRS[r % 3];
                    g.swap_rows(r / 3 * 3 + a, r / 3 * 3 + bb);
                    let (a, bb) = PAIRS[c % 3];
                    g.swap_columns(c / 3 * 3 + a, c / 3 * 3 + bb);
                    let (a, bb) = PAIRS[b];
                    g.swap_bands(a, bb);
                    let (a, bb) = PAIRS[s];
                    g.swap_stacks(a, bb);
                    if t {
                        g.transpose();
                    }
                    g
                },
            )
        }

        proptest! {
            #[test]
            fn prop_mask_idempotent(mask in arb_mask()) {
                let (rep, _) = CANON.canonicalize_mask(mask);
                prop_assert_eq!(CANON.canonicalize_mask(rep).0, rep);
            }

            #[test]
            fn prop_mask_orbit_invariant(mask in arb_mask(), g in arb_transform()) {
                let (rep, _) = CANON.canonicalize_mask(mask);
                let image = g.apply_to_set(mask);
                prop_assert_eq!(CANON.canonicalize_mask(image).0, rep);
            }

            #[test]
            fn prop_mask_transform_is_consistent(mask in arb_mask()) {
                let (rep, perm) = CANON.canonicalize_mask(mask);
                prop_assert_eq!(perm.apply_to_set(mask), rep);
            }
        }
    }

    #[test]
    fn test_problem_digit_relabel_invariance() {
        let canon = Canonicalizer::new();
        let solution: SolvedGrid = SOLUTION.parse().unwrap();
        let mask = CellSet::from_iter([2, 10, 27, 33, 48, 57, 70]);
        let problem = solution.restrict(mask);
        // Relabel digits with an arbitrary bijection; the canonical form
        // must not change.
        let relabel = GridPermutation {
            cell_perm: CellPermutation::identity(),
            digit_perm: [4, 0, 7, 2, 8, 1, 6, 3, 5],
        };
        let relabeled = relabel.apply_to_puzzle(&problem);
        assert_eq!(
            canon.canonicalize_problem(&problem).0,
            canon.canonicalize_problem(&relabeled).0
        );
    }
}
