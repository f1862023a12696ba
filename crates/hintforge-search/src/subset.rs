//! Minimum-hint search within a fixed superset of cells.
//!
//! Given a solution grid and a superset of at most 64 hint positions,
//! the searcher decides each position in turn, keeping it as a hint or
//! blanking it, and reports every subset in a hint-count window whose
//! restriction of the solution stays uniquely solvable. Unavoidable
//! sets projected into the superset drive both the branching order and
//! an independent-set lower bound on the hints still needed.

use std::ops::RangeInclusive;

use hintforge_core::{CellSet, Puzzle, SolvedGrid};
use hintforge_solver::{UaSets, UniquenessChecker};
use log::{debug, info};

/// Sentinel for branches that cannot produce a valid subset.
const NO_SUBSET: i32 = 99;

/// Enumerates uniquely solvable hint subsets of a superset of cells.
pub struct SubsetSearcher {
    checker: UniquenessChecker,
    solution: Option<SolvedGrid>,
    ua_sets: Vec<CellSet>,
    positions: Vec<usize>,
    pos_indices: [usize; 81],
    reduced: Vec<u64>,
}

impl SubsetSearcher {
    /// Creates a searcher whose uniqueness memo holds `memo_size` entries.
    #[must_use]
    pub fn new(memo_size: usize) -> Self {
        Self {
            checker: UniquenessChecker::new(memo_size),
            solution: None,
            ua_sets: Vec::new(),
            positions: Vec::new(),
            pos_indices: [usize::MAX; 81],
            reduced: Vec::new(),
        }
    }

    /// Fixes the solution grid and the unavoidable sets to project.
    pub fn set_solution(&mut self, solution: &SolvedGrid, ua_sets: &UaSets) {
        self.checker.set_solution(solution);
        self.solution = Some(*solution);
        self.ua_sets = ua_sets.iter().collect();
    }

    /// Fixes the superset of candidate hint positions. Returns `false`
    /// when some unavoidable set misses the superset entirely, in which
    /// case no subset can be uniquely solvable.
    ///
    /// # Panics
    ///
    /// Panics if the superset has more than 64 cells or no solution has
    /// been set.
    pub fn set_superset(&mut self, superset: CellSet) -> bool {
        assert!(!self.ua_sets.is_empty(), "set_solution comes first");
        assert!(superset.len() <= 64, "superset exceeds 64 cells");
        self.positions.clear();
        self.pos_indices = [usize::MAX; 81];
        for pos in superset {
            self.pos_indices[pos] = self.positions.len();
            self.positions.push(pos);
        }
        self.reduce_ua_sets(superset)
    }

    /// Projects every unavoidable set into superset index space, then
    /// keeps only the subset-minimal projections, smallest first.
    fn reduce_ua_sets(&mut self, superset: CellSet) -> bool {
        self.reduced.clear();
        for &set in &self.ua_sets {
            let mut projected = 0_u64;
            for pos in set & superset {
                projected |= 1 << self.pos_indices[pos];
            }
            if projected == 0 {
                return false;
            }
            self.reduced.push(projected);
        }
        self.reduced
            .sort_unstable_by_key(|&set| (set.count_ones(), set));
        self.reduced.dedup();
        let mut i = 0;
        while i < self.reduced.len() {
            let set = self.reduced[i];
            if self.reduced[..i].iter().any(|&prev| prev & set == prev) {
                self.reduced.remove(i);
            } else {
                i += 1;
            }
        }
        debug!(
            "subset search: {} unavoidable sets reduced to {}",
            self.ua_sets.len(),
            self.reduced.len()
        );
        true
    }

    /// Enumerates every subset whose hint count lies in `bounds` and
    /// whose restriction of the solution is uniquely solvable.
    ///
    /// # Panics
    ///
    /// Panics if no solution or superset has been set.
    pub fn search(&mut self, bounds: RangeInclusive<usize>) -> Vec<Puzzle> {
        let solution = self.solution.expect("search requires a solution");
        let size = self.positions.len();
        let full = if size == 64 {
            u64::MAX
        } else {
            (1 << size) - 1
        };
        let mut cur_mask = CellSet::new();
        for &pos in &self.positions {
            cur_mask.insert(pos);
        }

        let mut state = SubsetState {
            checker: &mut self.checker,
            solution: &solution,
            positions: &self.positions,
            size: size as i32,
            lower: *bounds.start() as i32,
            upper: *bounds.end() as i32,
            num_hints: 0,
            remaining: full,
            unvisited: full,
            cur_mask,
            buffer: vec![0; self.reduced.len() * (size + 1)],
            problems: Vec::new(),
        };
        state.buffer[..self.reduced.len()].copy_from_slice(&self.reduced);

        if state.lower <= state.size && state.upper >= 0 {
            state.search_rec(0, 0, self.reduced.len());
        }
        info!("subset search: {} problems found", state.problems.len());
        state.problems
    }
}

struct SubsetState<'a> {
    checker: &'a mut UniquenessChecker,
    solution: &'a SolvedGrid,
    positions: &'a [usize],
    size: i32,
    lower: i32,
    upper: i32,
    num_hints: i32,
    /// Superset indices not yet blanked.
    remaining: u64,
    /// Superset indices not yet decided.
    unvisited: u64,
    cur_mask: CellSet,
    /// Shared arena of projected unavoidable sets, one region per depth.
    buffer: Vec<u64>,
    problems: Vec<Puzzle>,
}

impl SubsetState<'_> {
    /// Returns the fewest hints of any valid subset in this branch, or a
    /// sentinel past the upper bound when none exists.
    fn search_rec(&mut self, depth: i32, begin: usize, end: usize) -> i32 {
        if depth == self.size - 2 || depth == self.size {
            if !self.checker.is_solution_unique(self.cur_mask) {
                return NO_SUBSET;
            }
            if depth == self.size {
                self.emit_problem();
                return self.num_hints;
            }
        }

        // Disjoint unavoidable sets each demand a distinct hint.
        let rem_num = (self.upper - self.num_hints).min(self.size - depth);
        let mut union_set = 0_u64;
        let mut independent = 0;
        for &set in &self.buffer[begin..end] {
            if union_set & set == 0 {
                independent += 1;
                if independent > rem_num {
                    return self.num_hints + independent;
                }
                union_set |= set;
            }
        }

        let mut degrees = [0_i32; 64];
        for &set in &self.buffer[begin..end] {
            let mut bits = set;
            while bits != 0 {
                degrees[bits.trailing_zeros() as usize] += 1;
                bits &= bits - 1;
            }
        }
        let mut index = usize::MAX;
        let mut index_degree = -1;
        let mut bits = self.unvisited;
        while bits != 0 {
            let i = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            if index_degree < degrees[i] {
                index = i;
                index_degree = degrees[i];
            }
        }
        let index_bit = 1_u64 << index;
        self.unvisited &= !index_bit;

        let mut min_num = if self.num_hints + 1 <= self.upper {
            let next_begin = end;
            let mut next_end = end;
            for i in begin..end {
                let set = self.buffer[i];
                if set & index_bit == 0 {
                    self.buffer[next_end] = set;
                    next_end += 1;
                }
            }
            self.num_hints += 1;
            let num = self.search_rec(depth + 1, next_begin, next_end);
            self.num_hints -= 1;
            num
        } else {
            self.upper + 1
        };

        // The blanking branch only matters if it can beat the keeping
        // branch by at least one hint.
        let original_lower = self.lower;
        if original_lower < min_num - 1 {
            self.lower = min_num - 1;
        }

        if self.num_hints + (self.size - depth - 1) >= self.lower {
            if let Some((next_begin, next_end)) = self.strip_index(index_bit, begin, end) {
                self.remaining &= !index_bit;
                self.cur_mask.remove(self.positions[index]);
                let num = self.search_rec(depth + 1, next_begin, next_end);
                min_num = min_num.min(num);
                self.cur_mask.insert(self.positions[index]);
                self.remaining |= index_bit;
            }
        }

        self.unvisited |= index_bit;
        self.lower = original_lower;
        min_num
    }

    /// Removes `index_bit` from every set in the current region, keeping
    /// only subset-minimal results in sorted order. Returns `None` when a
    /// set becomes empty, which rules out the blanking branch.
    fn strip_index(
        &mut self,
        index_bit: u64,
        begin: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        if self.buffer[begin..end].iter().all(|&set| set & index_bit == 0) {
            return Some((begin, end));
        }
        let mut next_end = begin;
        for i in begin..end {
            let stripped = self.buffer[i] & !index_bit;
            if stripped == 0 {
                return None;
            }
            if self.buffer[begin..next_end]
                .iter()
                .all(|&prev| prev & stripped != prev)
            {
                self.buffer[next_end] = stripped;
                next_end += 1;
            }
        }
        self.buffer[begin..next_end].sort_unstable_by_key(|&set| (set.count_ones(), set));
        Some((begin, next_end))
    }

    fn emit_problem(&mut self) {
        let mut problem = Puzzle::EMPTY;
        let mut bits = self.remaining;
        while bits != 0 {
            let index = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            let pos = self.positions[index];
            problem.set_digit(pos, self.solution.digit(pos));
        }
        self.problems.push(problem);
    }
}

#[cfg(test)]
mod tests {
    use hintforge_solver::UaFinder;

    use super::*;

    const SOLUTION: &str =
        "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn solution() -> SolvedGrid {
        SOLUTION.parse().unwrap()
    }

    /// Every cell except row 0 and column 0; exactly 64 cells.
    fn cross_complement() -> CellSet {
        !(0..81)
            .filter(|&cell| cell < 9 || cell % 9 == 0)
            .collect::<CellSet>()
    }

    fn searcher_for(solution: &SolvedGrid) -> SubsetSearcher {
        let mut searcher = SubsetSearcher::new(1 << 14);
        let ua_sets = UaFinder::find_all(solution, 5);
        searcher.set_solution(solution, &ua_sets);
        searcher
    }

    #[test]
    fn full_superset_is_reported() {
        let solution = solution();
        let superset = cross_complement();
        let mut searcher = searcher_for(&solution);
        assert!(searcher.set_superset(superset));

        let size = superset.len();
        let problems = searcher.search(size..=size);
        assert_eq!(problems, vec![solution.restrict(superset)]);
    }

    #[test]
    fn impossible_hint_counts_find_nothing() {
        let solution = solution();
        let mut searcher = searcher_for(&solution);
        assert!(searcher.set_superset(cross_complement()));
        assert!(searcher.search(0..=3).is_empty());
    }

    #[test]
    fn superset_missing_a_set_is_rejected() {
        // The solution has a four-cell unavoidable set in its top-left
        // corner, so a superset confined to the lower bands misses it.
        let solution = solution();
        let mut searcher = searcher_for(&solution);
        assert!(!searcher.set_superset((36..=60).collect()));
    }

    #[test]
    #[should_panic(expected = "superset exceeds 64 cells")]
    fn oversized_supersets_are_refused() {
        let solution = solution();
        let mut searcher = searcher_for(&solution);
        searcher.set_superset(CellSet::FULL);
    }
}
