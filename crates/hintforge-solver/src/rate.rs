//! Difficulty rating.
//!
//! The rating is a search-effort proxy: the number of forced-move rounds
//! plus a weighted count of guess candidates visited while counting the
//! solutions of a problem. Harder problems force the solver to branch more,
//! so the score grows monotonically with search effort. Unsolvable problems
//! rate `-1`.
//!
//! Ratings are stored squashed: small scores verbatim, the long tail folded
//! into logarithmic buckets so the full range fits in five digits.

use hintforge_core::Puzzle;

use crate::board::{SolverBoard, Step};

/// Cost of one guess candidate relative to one forced-move round.
const GUESS_WEIGHT: i64 = 100;

/// Scores below this are stored verbatim.
const SQUASH_KNEE: i64 = 90_000;

/// Width of one logarithmic tail bucket in the squashed scale.
const TAIL_STEP: i64 = 157;

/// Largest value [`squash_rate`] produces.
pub const MAX_SQUASHED_RATE: i64 = 99_999;

/// Rates `problem`, or returns `-1` when it has no solution.
#[must_use]
pub fn rate(problem: &Puzzle) -> i64 {
    let mut board = SolverBoard::from_puzzle(problem);
    let mut effort = 0;
    // Naked singles cascade while the hints are placed; cells determined
    // beyond the hints are one forced-move round like any other.
    if !board.is_invalid() && determined_cells(&board) > problem.hint_mask().len() {
        effort += 1;
    }
    let solutions = explore(&mut board, &mut effort);
    if solutions == 0 { -1 } else { effort }
}

fn determined_cells(board: &SolverBoard) -> usize {
    (0..81).filter(|&cell| board.is_determined(cell)).count()
}

/// Counts solutions saturated at two while accumulating effort.
fn explore(board: &mut SolverBoard, effort: &mut i64) -> u32 {
    loop {
        match board.make_step() {
            Step::Invalid => return 0,
            Step::Solved => return 1,
            Step::MadeMoves => *effort += 1,
            Step::Guess(tuple) => {
                *effort = effort.saturating_add(GUESS_WEIGHT * tuple.len() as i64);
                let mut total = 0;
                for guess in &tuple {
                    let mut child = board.clone();
                    child.assign(guess.cell as usize, guess.digit as usize);
                    total += explore(&mut child, effort);
                    if total >= 2 {
                        return 2;
                    }
                }
                return total;
            }
        }
    }
}

/// Compresses a rating into at most five digits, preserving order.
#[must_use]
pub fn squash_rate(rate: i64) -> i64 {
    if rate < SQUASH_KNEE {
        return rate;
    }
    let excess = (rate - SQUASH_KNEE) as u64;
    let bucket = i64::from((excess + 1).ilog2());
    (SQUASH_KNEE + bucket * TAIL_STEP).min(MAX_SQUASHED_RATE)
}

/// The smallest rating that squashes to at least `squashed`.
#[must_use]
pub fn unsquash_rate(squashed: i64) -> i64 {
    if squashed < SQUASH_KNEE {
        return squashed;
    }
    let bucket = ((squashed - SQUASH_KNEE) / TAIL_STEP).min(62);
    SQUASH_KNEE + (1i64 << bucket) - 1
}

#[cfg(test)]
mod tests {
    use hintforge_core::SolvedGrid;

    use super::*;

    const SOLUTION: &str = "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn solution() -> SolvedGrid {
        SOLUTION.parse().unwrap()
    }

    #[test]
    fn test_full_grid_rates_zero() {
        assert_eq!(rate(&Puzzle::from(solution())), 0);
    }

    #[test]
    fn test_unsolvable_rates_negative() {
        let mut problem = Puzzle::EMPTY;
        problem.set_digit(0, 3);
        problem.set_digit(1, 3);
        assert_eq!(rate(&problem), -1);
    }

    #[test]
    fn test_forced_moves_rate_low() {
        let problem = solution().restrict(!solution().cells_with_digit(6));
        let score = rate(&problem);
        assert!(score > 0);
        assert!(score < GUESS_WEIGHT);
    }

    #[test]
    fn test_guessing_rates_higher() {
        let forced = solution().restrict(!solution().cells_with_digit(6));
        let open = solution().restrict(
            !(solution().cells_with_digit(6) | solution().cells_with_digit(7)),
        );
        assert!(rate(&open) > rate(&forced));
    }

    #[test]
    fn test_squash_is_identity_below_the_knee() {
        for score in [-1, 0, 1, 42, SQUASH_KNEE - 1] {
            assert_eq!(squash_rate(score), score);
            assert_eq!(unsquash_rate(score), score);
        }
    }

    #[test]
    fn test_squash_round_trip_on_bucket_floors() {
        for bucket in 0..=40 {
            let squashed = SQUASH_KNEE + bucket * TAIL_STEP;
            assert_eq!(squash_rate(unsquash_rate(squashed)), squashed);
        }
    }

    #[test]
    fn test_squash_is_monotone_and_bounded() {
        let samples = [
            SQUASH_KNEE - 1,
            SQUASH_KNEE,
            SQUASH_KNEE + 1,
            SQUASH_KNEE + 1_000,
            1 << 20,
            1 << 40,
            i64::MAX / 2,
        ];
        let mut last = i64::MIN;
        for &score in &samples {
            let squashed = squash_rate(score);
            assert!(squashed >= last);
            assert!(squashed <= MAX_SQUASHED_RATE);
            last = squashed;
        }
    }
}
