//! Bitboard uniqueness oracle.
//!
//! [`DigitBoards`] keeps one 81-bit candidate board per digit and answers
//! naked-single and candidate-count queries with carry-save arithmetic over
//! the boards. [`UniquenessChecker`] runs a memoized solution count on top,
//! and when primed with a reference solution it answers whether a hint mask
//! admits any other completion.

use hintforge_core::{CellSet, Puzzle, SolvedGrid};

use crate::memo::MemoTable;
use crate::solver::Solutions;
use crate::tables::{NONADJACENCY_MASKS, ORACLE_HASH_COEFFS, UNIT_MASKS};

const UNSOLVED: u8 = u8::MAX;

/// Per-digit candidate boards.
#[derive(Clone)]
pub struct DigitBoards {
    boards: [CellSet; 9],
}

impl DigitBoards {
    /// Boards for the empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self { boards: [CellSet::FULL; 9] }
    }

    /// Candidate cells of `digit`.
    #[must_use]
    pub fn board(&self, digit: usize) -> CellSet {
        self.boards[digit]
    }

    /// Places `digit` at `cell`, clearing the cell everywhere and the
    /// digit's peers.
    pub fn assign(&mut self, cell: usize, digit: usize) {
        self.boards[digit] &= NONADJACENCY_MASKS[cell];
        for board in &mut self.boards {
            board.remove(cell);
        }
    }

    /// Cells that still hold at least one candidate.
    #[must_use]
    pub fn candidate_union(&self) -> CellSet {
        self.boards.iter().fold(CellSet::EMPTY, |acc, &b| acc | b)
    }

    /// Cells with exactly one candidate digit.
    #[must_use]
    pub fn solved_squares(&self) -> CellSet {
        let group = |a: CellSet, b: CellSet, c: CellSet| {
            // Exactly one of three set bits: odd parity without all-three.
            ((a ^ b ^ c) ^ (a & b & c), a | b | c)
        };
        let (e0, o0) = group(self.boards[0], self.boards[1], self.boards[2]);
        let (e1, o1) = group(self.boards[3], self.boards[4], self.boards[5]);
        let (e2, o2) = group(self.boards[6], self.boards[7], self.boards[8]);
        e0 & !(o1 | o2) | e1 & !(o0 | o2) | e2 & !(o0 | o1)
    }

    /// Cells with exactly two and exactly three candidates.
    #[must_use]
    pub fn candidate_pair_masks(&self) -> (CellSet, CellSet) {
        let mut c1 = CellSet::EMPTY;
        let mut c2 = CellSet::EMPTY;
        let mut c4 = CellSet::EMPTY;
        for &board in &self.boards {
            let carry = c1 & board;
            c1 ^= board;
            let carry2 = c2 & carry;
            c2 ^= carry;
            c4 |= carry2;
        }
        (c2 & !c1 & !c4, c2 & c1 & !c4)
    }

    /// Multiplicative hash over the packed board words.
    #[must_use]
    pub fn compute_hash(&self) -> u64 {
        let coeffs = &*ORACLE_HASH_COEFFS;
        let mut sum = coeffs.word_coeffs[0];
        for (i, &board) in self.boards.iter().enumerate() {
            let words = board.to_words();
            for (j, &word) in words.iter().enumerate() {
                let k = coeffs.word_coeffs[1 + i * 2 + j] | 1;
                sum = sum.wrapping_add(word.wrapping_mul(k));
            }
        }
        sum
    }
}

impl Default for DigitBoards {
    fn default() -> Self {
        Self::new()
    }
}

/// Search node: boards plus the digits assigned so far.
#[derive(Clone)]
struct CheckState {
    grid: DigitBoards,
    solved_digits: [u8; 81],
    solved_digits_hash: u64,
}

impl CheckState {
    fn new() -> Self {
        Self {
            grid: DigitBoards::new(),
            solved_digits: [UNSOLVED; 81],
            solved_digits_hash: 0,
        }
    }

    fn assign(&mut self, cell: usize, digit: usize) {
        self.grid.assign(cell, digit);
        self.solved_digits[cell] = digit as u8;
        self.solved_digits_hash ^= ORACLE_HASH_COEFFS.cell_coeffs[cell][digit];
    }
}

/// Memoized solution counter with an optional reference solution.
pub struct UniquenessChecker {
    memo: MemoTable<u8>,
    solution: Option<[u8; 81]>,
}

impl UniquenessChecker {
    /// A checker whose memo holds `memo_size` buckets.
    #[must_use]
    pub fn new(memo_size: usize) -> Self {
        Self { memo: MemoTable::new(memo_size), solution: None }
    }

    /// Primes the checker with the solution that subsequent
    /// [`is_solution_unique`](Self::is_solution_unique) calls test against.
    pub fn set_solution(&mut self, solution: &SolvedGrid) {
        let mut digits = [0u8; 81];
        for (cell, digit) in digits.iter_mut().enumerate() {
            *digit = solution.digit(cell) - 1;
        }
        self.solution = Some(digits);
        self.memo.clear();
    }

    /// Drops the reference solution.
    pub fn unset_solution(&mut self) {
        self.solution = None;
        self.memo.clear();
    }

    /// `true` when the hints of the reference solution at `mask` admit no
    /// other completion.
    ///
    /// # Panics
    ///
    /// Panics if no reference solution is set.
    pub fn is_solution_unique(&mut self, mask: CellSet) -> bool {
        let solution = self.solution.expect("reference solution set");
        let mut state = CheckState::new();
        for cell in mask.iter() {
            state.assign(cell, usize::from(solution[cell]));
        }
        self.check(&mut state) == 1
    }

    /// Counts the solutions of `problem`, saturated at two.
    pub fn count_solutions(&mut self, problem: &Puzzle) -> Solutions {
        let mut state = CheckState::new();
        for cell in problem.hint_mask().iter() {
            let digit = usize::from(problem.digit(cell)) - 1;
            // A hint clashing with an earlier one has already been pruned
            // from its board.
            if !state.grid.board(digit).contains(cell) {
                return Solutions::None;
            }
            state.assign(cell, digit);
        }
        let saved = self.solution.take();
        self.memo.clear();
        let count = self.check(&mut state);
        self.solution = saved;
        self.memo.clear();
        match count {
            0 => Solutions::None,
            1 => Solutions::One,
            _ => Solutions::Many,
        }
    }

    /// Counts completions of `state`, saturated at two. When a reference
    /// solution is set, completions differing from it count as two.
    fn check(&mut self, state: &mut CheckState) -> u32 {
        loop {
            let solved = state.grid.solved_squares();
            if solved.is_empty() {
                break;
            }
            for cell in solved.iter() {
                for digit in 0..9 {
                    if state.grid.board(digit).contains(cell) {
                        state.assign(cell, digit);
                        break;
                    }
                }
            }
        }

        let hash = state.grid.compute_hash() ^ state.solved_digits_hash;
        if let Some(result) = self.memo.find(hash) {
            return u32::from(result);
        }

        if self.resolve_hidden_singles(state) {
            let result = self.check(state);
            self.memo.insert(hash, result as u8);
            return result;
        }

        let candidates = state.grid.candidate_union();
        let mut unsolved = 0;
        for cell in 0..81 {
            if state.solved_digits[cell] != UNSOLVED {
                continue;
            }
            if !candidates.contains(cell) {
                self.memo.insert(hash, 0);
                return 0;
            }
            unsolved += 1;
        }
        if unsolved == 0 {
            let result = match &self.solution {
                Some(solution) if state.solved_digits != *solution => 2,
                _ => 1,
            };
            self.memo.insert(hash, result);
            return u32::from(result);
        }

        let mut total = 0;
        for (cell, digit) in self.branch_candidates(state) {
            let mut child = state.clone();
            child.assign(cell, digit);
            total += self.check(&mut child);
            if total >= 2 {
                total = 2;
                break;
            }
        }
        self.memo.insert(hash, total as u8);
        total
    }

    /// Assigns every hidden single; `true` if any was found.
    fn resolve_hidden_singles(&self, state: &mut CheckState) -> bool {
        let mut any = false;
        for digit in 0..9 {
            for unit in 0..27 {
                let mask = state.grid.board(digit) & UNIT_MASKS[unit];
                if mask.len() == 1 {
                    state.assign(mask.first(), digit);
                    any = true;
                }
            }
        }
        any
    }

    /// Picks the branch point: a two-candidate cell, then a three-candidate
    /// cell, then the smallest unit-digit tuple. Branches matching the
    /// reference solution come first.
    fn branch_candidates(&self, state: &CheckState) -> Vec<(usize, usize)> {
        let (pairs, triples) = state.grid.candidate_pair_masks();
        let cell = if !pairs.is_empty() {
            Some(pairs.first())
        } else if !triples.is_empty() {
            Some(triples.first())
        } else {
            None
        };
        let mut branches = if let Some(cell) = cell {
            (0..9)
                .filter(|&d| state.grid.board(d).contains(cell))
                .map(|d| (cell, d))
                .collect::<Vec<_>>()
        } else {
            let mut best: Option<(usize, usize, CellSet)> = None;
            'outer: for digit in 0..9 {
                for unit in 0..27 {
                    let mask = state.grid.board(digit) & UNIT_MASKS[unit];
                    let len = mask.len();
                    if len < 2 {
                        continue;
                    }
                    if best.as_ref().is_none_or(|&(_, l, _)| len < l) {
                        best = Some((digit, len, mask));
                        if len == 2 {
                            break 'outer;
                        }
                    }
                }
            }
            let (digit, _, mask) = best.expect("an unsolved grid has a branch tuple");
            mask.iter().map(|cell| (cell, digit)).collect()
        };
        if let Some(solution) = &self.solution {
            if let Some(pos) = branches
                .iter()
                .position(|&(c, d)| usize::from(solution[c]) == d)
            {
                branches.swap(0, pos);
            }
        }
        branches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLUTION: &str = "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn solution() -> SolvedGrid {
        SOLUTION.parse().unwrap()
    }

    #[test]
    fn test_solved_squares_after_eight_assignments() {
        let mut boards = DigitBoards::new();
        for cell in 0..8 {
            boards.assign(cell, cell);
        }
        // The last cell of the row is forced to the ninth digit.
        assert!(boards.solved_squares().contains(8));
        assert!(boards.board(8).contains(8));
        assert_eq!(boards.board(0) & UNIT_MASKS[0], CellSet::EMPTY);
    }

    #[test]
    fn test_candidate_count_masks() {
        let mut boards = DigitBoards::new();
        for cell in 0..7 {
            boards.assign(cell, cell);
        }
        let (pairs, triples) = boards.candidate_pair_masks();
        // Cells 7 and 8 each hold the two remaining row digits.
        assert!(pairs.contains(7));
        assert!(pairs.contains(8));
        assert!(!triples.contains(7));
    }

    #[test]
    fn test_hash_is_order_independent() {
        let mut a = DigitBoards::new();
        a.assign(0, 0);
        a.assign(40, 4);
        let mut b = DigitBoards::new();
        b.assign(40, 4);
        b.assign(0, 0);
        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_ne!(a.compute_hash(), DigitBoards::new().compute_hash());
    }

    #[test]
    fn test_full_mask_is_unique() {
        let mut checker = UniquenessChecker::new(1 << 12);
        checker.set_solution(&solution());
        assert!(checker.is_solution_unique(CellSet::FULL));
    }

    #[test]
    fn test_empty_mask_is_not_unique() {
        let mut checker = UniquenessChecker::new(1 << 16);
        checker.set_solution(&solution());
        assert!(!checker.is_solution_unique(CellSet::EMPTY));
    }

    #[test]
    fn test_missing_digit_stays_unique() {
        let mut checker = UniquenessChecker::new(1 << 12);
        checker.set_solution(&solution());
        let mask = !solution().cells_with_digit(7);
        assert!(checker.is_solution_unique(mask));
    }

    #[test]
    fn test_two_missing_digits_break_uniqueness() {
        // Relabeling two fully blanked digits yields another completion.
        let mut checker = UniquenessChecker::new(1 << 14);
        checker.set_solution(&solution());
        let mask = !(solution().cells_with_digit(3) | solution().cells_with_digit(4));
        assert!(!checker.is_solution_unique(mask));
    }

    #[test]
    fn test_count_agrees_with_the_backtracking_solver() {
        use crate::solver::Solver;

        let mut checker = UniquenessChecker::new(1 << 14);
        let mut solver = Solver::new(1 << 14);
        let puzzles = [
            Puzzle::from(solution()),
            solution().restrict(!solution().cells_with_digit(2)),
            solution().restrict(
                !(solution().cells_with_digit(1) | solution().cells_with_digit(9)),
            ),
            {
                let mut p = Puzzle::EMPTY;
                p.set_digit(0, 5);
                p.set_digit(9, 5);
                p
            },
        ];
        for puzzle in &puzzles {
            assert_eq!(checker.count_solutions(puzzle), solver.solve(puzzle));
        }
    }
}
