//! Backtracking solver over [`SolverBoard`].
//!
//! Counting runs are memoized by board hash so equivalent subtrees reached
//! through different guess orders are resolved once. Solution search skips
//! the memo and can randomize guess order to sample solutions of
//! under-constrained grids.

use hintforge_core::{Puzzle, SolvedGrid};
use rand::seq::SliceRandom;
use rand::{SeedableRng, TryRng, rngs::SysRng};
use rand_pcg::Pcg64Mcg;

use crate::board::{SolverBoard, Step};
use crate::memo::MemoTable;

/// Solution count, saturated at two.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Solutions {
    /// The grid has no solution.
    None,
    /// Exactly one solution.
    One,
    /// More than one solution.
    Many,
}

/// Reusable solver with a counting memo.
pub struct Solver {
    memo: MemoTable<u8>,
    rng: Pcg64Mcg,
}

impl Solver {
    /// A solver whose memo holds `memo_size` buckets.
    ///
    /// # Panics
    ///
    /// Panics if the operating system random source is unavailable.
    #[must_use]
    pub fn new(memo_size: usize) -> Self {
        let mut seed = [0u8; 16];
        SysRng
            .try_fill_bytes(&mut seed)
            .unwrap_or_else(|err| panic!("operating system rng unavailable: {err}"));
        Self {
            memo: MemoTable::new(memo_size),
            rng: Pcg64Mcg::from_seed(seed),
        }
    }

    /// Counts the solutions of `problem`, saturated at two.
    pub fn solve(&mut self, problem: &Puzzle) -> Solutions {
        self.memo.clear();
        let mut board = SolverBoard::from_puzzle(problem);
        match self.count(&mut board) {
            0 => Solutions::None,
            1 => Solutions::One,
            _ => Solutions::Many,
        }
    }

    /// Finds some solution of `problem`, visiting guesses in shuffled order
    /// when `randomize` is set.
    pub fn find_solution(&mut self, problem: &Puzzle, randomize: bool) -> Option<SolvedGrid> {
        let mut board = SolverBoard::from_puzzle(problem);
        if !self.search(&mut board, randomize) {
            return None;
        }
        let mut digits = [0u8; 81];
        for (cell, digit) in digits.iter_mut().enumerate() {
            *digit = board.solution_digit(cell) + 1;
        }
        Some(SolvedGrid::from_digits(digits))
    }

    fn count(&mut self, board: &mut SolverBoard) -> u32 {
        let mut history = Vec::new();
        loop {
            let hash = board.hash();
            if let Some(result) = self.memo.find(hash) {
                self.record(&history, result);
                return u32::from(result);
            }
            history.push(hash);
            match board.make_step() {
                Step::Invalid => {
                    self.record(&history, 0);
                    return 0;
                }
                Step::Solved => {
                    self.record(&history, 1);
                    return 1;
                }
                Step::MadeMoves => {}
                Step::Guess(tuple) => {
                    let mut total = 0;
                    for guess in &tuple {
                        let mut child = board.clone();
                        child.assign(guess.cell as usize, guess.digit as usize);
                        total += self.count(&mut child);
                        if total >= 2 {
                            total = 2;
                            break;
                        }
                    }
                    self.record(&history, total as u8);
                    return total;
                }
            }
        }
    }

    fn search(&mut self, board: &mut SolverBoard, randomize: bool) -> bool {
        loop {
            match board.make_step() {
                Step::Invalid => return false,
                Step::Solved => return true,
                Step::MadeMoves => {}
                Step::Guess(mut tuple) => {
                    if randomize {
                        tuple.as_mut_slice().shuffle(&mut self.rng);
                    }
                    for guess in &tuple {
                        let mut child = board.clone();
                        child.assign(guess.cell as usize, guess.digit as usize);
                        if self.search(&mut child, randomize) {
                            *board = child;
                            return true;
                        }
                    }
                    return false;
                }
            }
        }
    }

    fn record(&mut self, history: &[u64], result: u8) {
        for &hash in history {
            self.memo.insert(hash, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLUTION: &str = "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn solution() -> SolvedGrid {
        SOLUTION.parse().unwrap()
    }

    fn assert_valid_solution(grid: &SolvedGrid) {
        for digit in 1..=9 {
            let cells: Vec<_> = grid.cells_with_digit(digit).iter().collect();
            assert_eq!(cells.len(), 9);
            let mut rows = [false; 9];
            let mut cols = [false; 9];
            let mut blocks = [false; 9];
            for cell in cells {
                rows[cell / 9] = true;
                cols[cell % 9] = true;
                blocks[cell / 9 / 3 * 3 + cell % 9 / 3] = true;
            }
            assert_eq!(rows, [true; 9]);
            assert_eq!(cols, [true; 9]);
            assert_eq!(blocks, [true; 9]);
        }
    }

    #[test]
    fn test_full_grid_has_one_solution() {
        let mut solver = Solver::new(1 << 10);
        let problem = Puzzle::from(solution());
        assert_eq!(solver.solve(&problem), Solutions::One);
        assert_eq!(solver.find_solution(&problem, false), Some(solution()));
    }

    #[test]
    fn test_conflicting_hints_have_no_solution() {
        let mut solver = Solver::new(1 << 10);
        let mut problem = Puzzle::EMPTY;
        problem.set_digit(0, 1);
        problem.set_digit(1, 1);
        assert_eq!(solver.solve(&problem), Solutions::None);
        assert_eq!(solver.find_solution(&problem, false), None);
    }

    #[test]
    fn test_empty_grid_has_many_solutions() {
        let mut solver = Solver::new(1 << 16);
        assert_eq!(solver.solve(&Puzzle::EMPTY), Solutions::Many);
        let found = solver.find_solution(&Puzzle::EMPTY, true).unwrap();
        assert_valid_solution(&found);
    }

    #[test]
    fn test_single_missing_digit_is_forced() {
        // Blanking every cell of one digit leaves a uniquely solvable grid.
        let mut solver = Solver::new(1 << 10);
        let keep = !solution().cells_with_digit(5);
        let problem = solution().restrict(keep);
        assert_eq!(solver.solve(&problem), Solutions::One);
        assert_eq!(solver.find_solution(&problem, false), Some(solution()));
    }

    #[test]
    fn test_two_missing_digits_can_be_swapped() {
        // With two digits fully blanked, relabeling them yields a second
        // solution.
        let mut solver = Solver::new(1 << 12);
        let blank = solution().cells_with_digit(1) | solution().cells_with_digit(2);
        let problem = solution().restrict(!blank);
        assert_eq!(solver.solve(&problem), Solutions::Many);
    }
}
