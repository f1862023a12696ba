//! Symmetry-reduced hint mask search.
//!
//! The searcher walks a [`RowPermutationDiagram`] row by row, building a
//! candidate hint mask for a fixed solution grid. Rows are consumed in a
//! band order chosen per solution so that small unavoidable sets complete
//! as early as possible; a partial mask that misses a completed
//! unavoidable set can never yield a unique puzzle and is cut off. Masks
//! surviving to a leaf are verified with the uniqueness checker.

use hintforge_core::{CellSet, SolvedGrid};
use hintforge_solver::{UaFinder, UaSets, UniquenessChecker};
use log::debug;

use crate::diagram::{RowPermutationDiagram, Target};

/// Per-digit hint count limits applied while masks are built.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DigitCountBounds {
    /// Minimum hints per digit in an emitted mask.
    pub lower: usize,
    /// Maximum hints per digit in an emitted mask.
    pub upper: usize,
}

impl Default for DigitCountBounds {
    fn default() -> Self {
        Self { lower: 0, upper: 81 }
    }
}

impl DigitCountBounds {
    fn is_active(self) -> bool {
        self.lower > 0 || self.upper < 81
    }
}

/// A hint mask whose restriction of the solution is uniquely solvable.
#[derive(Clone, Copy, Debug)]
pub struct SearchHit {
    /// Cells kept as hints.
    pub mask: CellSet,
    /// Index of the originating pattern in the diagram's batch.
    pub pattern_index: usize,
}

/// Weight of an unavoidable set completing before a given depth: the
/// number of search subtrees below that depth, so sets that complete
/// early prune the most.
fn depth_weights() -> [u64; 10] {
    let mut w = [1_u64; 10];
    for i in (0..9).rev() {
        let branches = if i % 3 == 0 { 3 - i / 3 } else { 3 - i % 3 };
        w[i] = w[i + 1] * branches as u64;
    }
    w
}

const BAND_ORDERS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Searches one solution grid for uniquely solvable hint masks drawn
/// from a pattern diagram.
pub struct SymmetrySearcher {
    checker: UniquenessChecker,
    ready: bool,
    /// Maps search depth to the solution row consumed at that depth.
    depth_row: [usize; 9],
    /// Zero-based solution digits per depth and column.
    depth_digits: [[u8; 9]; 9],
    /// Unavoidable sets in depth space, completing at depths 0..=5.
    ua_two: [Vec<u64>; 6],
    /// Sets reaching into the last band, completing at depths 6..=8.
    ua_three: [Vec<(u64, u32)>; 3],
}

impl SymmetrySearcher {
    /// Creates a searcher whose uniqueness memo holds `memo_size` entries.
    #[must_use]
    pub fn new(memo_size: usize) -> Self {
        Self {
            checker: UniquenessChecker::new(memo_size),
            ready: false,
            depth_row: [0; 9],
            depth_digits: [[0; 9]; 9],
            ua_two: Default::default(),
            ua_three: Default::default(),
        }
    }

    /// Prepares the searcher for `solution`, finding unavoidable sets up
    /// to `ua_size` cells and fixing the band traversal order.
    pub fn set_solution(&mut self, solution: &SolvedGrid, ua_size: usize) {
        self.checker.set_solution(solution);
        let ua_sets = UaFinder::find_all(solution, ua_size);
        self.choose_band_order(&ua_sets);
        for depth in 0..9 {
            let row = self.depth_row[depth];
            for col in 0..9 {
                self.depth_digits[depth][col] = solution.digit(row * 9 + col) - 1;
            }
        }
        self.regroup_ua_sets(&ua_sets);
        self.ready = true;
    }

    /// Picks the band order that maximizes the pruning weight of the
    /// short unavoidable sets, then fills `depth_row` with its inverse.
    fn choose_band_order(&mut self, ua_sets: &UaSets) {
        let weights = depth_weights();
        let mut row_masks = Vec::new();
        for set in ua_sets.iter() {
            if set.len() > 6 {
                continue;
            }
            let mut rows = 0_u16;
            for cell in set {
                rows |= 1 << (cell / 9);
            }
            row_masks.push(rows);
        }

        let mut best_order = BAND_ORDERS[0];
        let mut best_weight = 0;
        for order in BAND_ORDERS {
            let mut weight = 0;
            for &rows in &row_masks {
                let mut last = 0;
                let mut bits = rows;
                while bits != 0 {
                    let row = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    last = last.max(order[row / 3] * 3 + row % 3);
                }
                weight += weights[last + 1];
            }
            if best_weight < weight {
                best_weight = weight;
                best_order = order;
            }
        }

        for row in 0..9 {
            self.depth_row[best_order[row / 3] * 3 + row % 3] = row;
        }
    }

    /// Projects every unavoidable set into depth space and buckets it by
    /// the depth at which its last cell is decided.
    fn regroup_ua_sets(&mut self, ua_sets: &UaSets) {
        let mut row_depth = [0; 9];
        for depth in 0..9 {
            row_depth[self.depth_row[depth]] = depth;
        }
        self.ua_two = Default::default();
        self.ua_three = Default::default();
        for set in ua_sets.iter() {
            let mut masks = [0_u32; 3];
            let mut last = 0;
            for cell in set {
                let d = row_depth[cell / 9];
                masks[d / 3] |= 1 << (d % 3 * 9 + cell % 9);
                last = last.max(d);
            }
            let lo = u64::from(masks[0]) | u64::from(masks[1]) << 32;
            if last < 6 {
                self.ua_two[last].push(lo);
            } else {
                self.ua_three[last - 6].push((lo, masks[2]));
            }
        }
    }

    /// Walks `diagram` and returns every hint mask that yields a uniquely
    /// solvable puzzle within `bounds`.
    ///
    /// # Panics
    ///
    /// Panics if no solution has been set.
    pub fn search(
        &mut self,
        diagram: &RowPermutationDiagram,
        bounds: DigitCountBounds,
    ) -> Vec<SearchHit> {
        assert!(self.ready, "search requires a solution");
        let mut dfs = Dfs {
            diagram,
            checker: &mut self.checker,
            depth_row: &self.depth_row,
            depth_digits: &self.depth_digits,
            ua_two: &self.ua_two,
            ua_three: &self.ua_three,
            bounds,
            count_digits: bounds.is_active(),
            cur: [0; 3],
            digit_counts: [0; 9],
            hits: Vec::new(),
        };
        dfs.walk(diagram.root(), 0);
        debug!("symmetry search: {} hits", dfs.hits.len());
        dfs.hits
    }
}

struct Dfs<'a> {
    diagram: &'a RowPermutationDiagram,
    checker: &'a mut UniquenessChecker,
    depth_row: &'a [usize; 9],
    depth_digits: &'a [[u8; 9]; 9],
    ua_two: &'a [Vec<u64>; 6],
    ua_three: &'a [Vec<(u64, u32)>; 3],
    bounds: DigitCountBounds,
    count_digits: bool,
    /// Partial mask in depth space, 27 bits per band.
    cur: [u32; 3],
    digit_counts: [usize; 9],
    hits: Vec<SearchHit>,
}

impl Dfs<'_> {
    fn walk(&mut self, node: u32, depth: usize) {
        for edge in self.diagram.edges(node) {
            let row_mask = edge.row_mask();
            if self.count_digits && !self.add_digit_counts(depth, row_mask) {
                continue;
            }
            self.cur[depth / 3] |= u32::from(row_mask) << (depth % 3 * 9);
            if !self.ua_pruned(depth) {
                match edge.target() {
                    Target::Leaf(leaf) => self.emit(leaf),
                    Target::Node(child) => self.walk(child, depth + 1),
                }
            }
            self.cur[depth / 3] &= !(u32::from(row_mask) << (depth % 3 * 9));
            if self.count_digits {
                self.remove_digit_counts(depth, row_mask);
            }
        }
    }

    /// Counts the digits a row mask adds; rolls back and reports failure
    /// when a digit exceeds its upper bound or a lower bound becomes
    /// unreachable with the rows left.
    fn add_digit_counts(&mut self, depth: usize, row_mask: u16) -> bool {
        let mut bits = row_mask;
        while bits != 0 {
            let col = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            let digit = usize::from(self.depth_digits[depth][col]);
            self.digit_counts[digit] += 1;
            if self.digit_counts[digit] > self.bounds.upper {
                // Roll back only the columns counted so far.
                self.remove_digit_counts(depth, row_mask & !bits);
                return false;
            }
        }
        let remaining = 8 - depth;
        if remaining < self.bounds.lower {
            let floor = self.bounds.lower - remaining;
            if self.digit_counts.iter().any(|&count| count < floor) {
                self.remove_digit_counts(depth, row_mask);
                return false;
            }
        }
        true
    }

    fn remove_digit_counts(&mut self, depth: usize, row_mask: u16) {
        let mut bits = row_mask;
        while bits != 0 {
            let col = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            self.digit_counts[usize::from(self.depth_digits[depth][col])] -= 1;
        }
    }

    /// An unavoidable set whose last row was just decided must intersect
    /// the partial mask; otherwise every completion has a twin solution.
    fn ua_pruned(&self, depth: usize) -> bool {
        let lo = u64::from(self.cur[0]) | u64::from(self.cur[1]) << 32;
        if depth < 6 {
            self.ua_two[depth].iter().any(|&ua| lo & ua == 0)
        } else {
            let hi = self.cur[2];
            self.ua_three[depth - 6]
                .iter()
                .any(|&(ua_lo, ua_hi)| lo & ua_lo == 0 && hi & ua_hi == 0)
        }
    }

    /// Maps the depth-space mask back to grid rows and keeps it when the
    /// restricted solution is uniquely solvable.
    fn emit(&mut self, leaf: u32) {
        let mut mask = CellSet::new();
        for band in 0..3 {
            let mut bits = self.cur[band];
            while bits != 0 {
                let i = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                let row = self.depth_row[band * 3 + i / 9];
                mask.insert(row * 9 + i % 9);
            }
        }
        if self.checker.is_solution_unique(mask) {
            self.hits.push(SearchHit {
                mask,
                pattern_index: self.diagram.leaf_pattern(leaf),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use hintforge_core::rows::enumerate_orbit;

    use super::*;

    const SOLUTION: &str =
        "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn solution() -> SolvedGrid {
        SOLUTION.parse().unwrap()
    }

    fn searcher_for(solution: &SolvedGrid) -> SymmetrySearcher {
        let mut searcher = SymmetrySearcher::new(1 << 14);
        searcher.set_solution(solution, 5);
        searcher
    }

    #[test]
    fn depth_weights_count_subtrees() {
        let weights = depth_weights();
        assert_eq!(weights, [48, 16, 8, 8, 4, 2, 2, 2, 1, 1]);
    }

    #[test]
    fn full_mask_is_its_own_hit() {
        let solution = solution();
        let diagram = RowPermutationDiagram::build(&[CellSet::FULL]);
        let mut searcher = searcher_for(&solution);
        let hits = searcher.search(&diagram, DigitCountBounds::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].mask, CellSet::FULL);
        assert_eq!(hits[0].pattern_index, 0);
    }

    #[test]
    fn empty_mask_yields_no_hits() {
        let solution = solution();
        let diagram = RowPermutationDiagram::build(&[CellSet::EMPTY]);
        let mut searcher = searcher_for(&solution);
        assert!(searcher.search(&diagram, DigitCountBounds::default()).is_empty());
    }

    #[test]
    fn finds_every_orbit_image_of_one_empty_line() {
        // Blanking one full row or column leaves every blank cell a
        // single candidate, so all 18 orbit images are uniquely
        // solvable and must be found.
        let solution = solution();
        let pattern = !(0..9).collect::<CellSet>();
        let diagram = RowPermutationDiagram::build(&[pattern]);
        let mut searcher = searcher_for(&solution);
        let hits = searcher.search(&diagram, DigitCountBounds::default());

        let mut found: Vec<CellSet> = hits.iter().map(|hit| hit.mask).collect();
        found.sort_unstable();
        found.dedup();
        let mut expected = enumerate_orbit(pattern);
        expected.sort_unstable();
        assert_eq!(found, expected);
    }

    #[test]
    fn digit_count_bounds_filter_hits() {
        // One blank line removes exactly one cell of every digit.
        let solution = solution();
        let pattern = !(0..9).collect::<CellSet>();
        let diagram = RowPermutationDiagram::build(&[pattern]);
        let mut searcher = searcher_for(&solution);

        let capped = searcher.search(&diagram, DigitCountBounds { lower: 0, upper: 7 });
        assert!(capped.is_empty());

        let exact = searcher.search(&diagram, DigitCountBounds { lower: 8, upper: 8 });
        assert_eq!(exact.len(), 18);
    }
}
