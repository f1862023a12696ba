//! Candidate board with eager singles propagation.
//!
//! [`SolverBoard`] tracks a 9-bit candidate mask per cell plus, for every
//! (unit, digit) pair, the unit positions where that digit is still possible
//! in an *undetermined* cell. Assigning a digit propagates naked singles
//! transitively; [`SolverBoard::make_step`] adds hidden singles and box-line
//! reduction, and reports the smallest guess tuple once no cheap move
//! remains. A running XOR hash over live candidates keys the solve memo.

use hintforge_core::Puzzle;
use tinyvec::ArrayVec;

use crate::tables::{BOARD_HASH_COEFFS, CLAIM_PATTERNS, FULL_MASK, unit_cell};

/// One branch candidate: a digit for a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Guess {
    /// Cell position `0..81`.
    pub cell: u8,
    /// Digit `0..9` (zero-based).
    pub digit: u8,
}

/// The candidates of a guess point, smallest tuple first found.
pub type GuessTuple = ArrayVec<[Guess; 9]>;

/// Outcome of one propagation step.
#[derive(Clone, Debug)]
pub enum Step {
    /// Some cell lost all candidates.
    Invalid,
    /// Every cell is determined.
    Solved,
    /// Forced moves were applied; step again.
    MadeMoves,
    /// No forced move exists; branch on the tuple.
    Guess(GuessTuple),
}

/// Candidate board for counting and finding solutions.
#[derive(Clone)]
pub struct SolverBoard {
    cell_masks: [u16; 81],
    unit_masks: [[u16; 9]; 27],
    invalid: bool,
    hash: u64,
}

impl SolverBoard {
    /// An empty board with every candidate live.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell_masks: [FULL_MASK; 81],
            unit_masks: [[FULL_MASK; 9]; 27],
            invalid: false,
            hash: BOARD_HASH_COEFFS.initial,
        }
    }

    /// A board with the hints of `problem` assigned and propagated.
    #[must_use]
    pub fn from_puzzle(problem: &Puzzle) -> Self {
        let mut board = Self::new();
        for cell in 0..81 {
            let d = problem.digit(cell);
            if d != 0 {
                board.apply_mask(cell, 1 << (d - 1));
            }
        }
        board
    }

    /// `true` once a contradiction has been derived.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Candidate mask of `cell`.
    #[must_use]
    pub fn cell_mask(&self, cell: usize) -> u16 {
        self.cell_masks[cell]
    }

    /// Positions in `unit` where `digit` is still possible in an
    /// undetermined cell.
    #[must_use]
    pub fn unit_mask(&self, unit: usize, digit: usize) -> u16 {
        self.unit_masks[unit][digit]
    }

    /// XOR hash over live candidates; equal boards hash equal.
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// `true` if `cell` has at most one candidate left.
    #[must_use]
    pub fn is_determined(&self, cell: usize) -> bool {
        let mask = self.cell_masks[cell];
        mask & mask.wrapping_sub(1) == 0
    }

    /// The digit of a solved cell.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not determined to exactly one digit.
    #[must_use]
    pub fn solution_digit(&self, cell: usize) -> u8 {
        let mask = self.cell_masks[cell];
        assert!(mask != 0 && mask & (mask - 1) == 0);
        mask.trailing_zeros() as u8
    }

    /// Restricts `cell` to `digit` and propagates.
    pub fn assign(&mut self, cell: usize, digit: usize) {
        self.apply_mask(cell, 1 << digit);
    }

    /// Removes `digit` from `cell` and propagates.
    pub fn eliminate(&mut self, cell: usize, digit: usize) {
        self.apply_mask(cell, !(1 << digit));
    }

    /// Intersects the candidates of `cell` with `mask`, propagating any
    /// naked single this creates.
    pub fn apply_mask(&mut self, cell: usize, mask: u16) {
        let changed = self.cell_masks[cell] & !mask;
        if changed == 0 {
            return;
        }
        self.cell_masks[cell] &= mask;
        let applied = self.cell_masks[cell];

        let mut bits = changed;
        while bits != 0 {
            let d = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            self.hash ^= BOARD_HASH_COEFFS.coeffs[cell][d];
        }

        let (row, col) = (cell / 9, cell % 9);
        let (band, block_row) = (row / 3, row % 3);
        let (stack, block_col) = (col / 3, col % 3);
        let block_index = block_row * 3 + block_col;
        let block = band * 3 + stack;
        let mut bits = changed;
        while bits != 0 {
            let d = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            self.unit_masks[row][d] &= !(1 << col);
            self.unit_masks[9 + col][d] &= !(1 << row);
            self.unit_masks[18 + block][d] &= !(1 << block_index);
        }

        if applied == 0 {
            self.invalid = true;
        } else if applied & (applied - 1) == 0 {
            let d = applied.trailing_zeros() as usize;
            self.unit_masks[row][d] = 0;
            self.unit_masks[9 + col][d] = 0;
            self.unit_masks[18 + block][d] = 0;
            for x in 0..9 {
                if x != col && self.cell_masks[row * 9 + x] & applied != 0 {
                    self.apply_mask(row * 9 + x, !applied);
                }
            }
            for y in 0..9 {
                if y != row && self.cell_masks[y * 9 + col] & applied != 0 {
                    self.apply_mask(y * 9 + col, !applied);
                }
            }
            for y in 0..3 {
                if y == block_row {
                    continue;
                }
                for x in 0..3 {
                    if x == block_col {
                        continue;
                    }
                    let cell2 = (band * 3 + y) * 9 + (stack * 3 + x);
                    if self.cell_masks[cell2] & applied != 0 {
                        self.apply_mask(cell2, !applied);
                    }
                }
            }
        }
    }

    /// Applies hidden singles and box-line reduction, or reports the
    /// smallest guess tuple.
    #[must_use]
    pub fn make_step(&mut self) -> Step {
        if self.invalid {
            return Step::Invalid;
        }

        let mut min_tuple = GuessTuple::new();
        let mut min_size = 10;

        let mut moves = 0;
        for unit in 0..27 {
            for d in 0..9 {
                let mask = self.unit_masks[unit][d];
                if mask == 0 {
                    continue;
                }
                let cnt = mask.count_ones() as usize;
                if cnt == 1 {
                    let index = mask.trailing_zeros() as usize;
                    self.assign(unit_cell(unit, index), d);
                    moves += 1;
                } else if cnt < min_size {
                    min_size = cnt;
                    min_tuple.clear();
                    let mut bits = mask;
                    while bits != 0 {
                        let index = bits.trailing_zeros() as usize;
                        bits &= bits - 1;
                        min_tuple.push(Guess {
                            cell: unit_cell(unit, index) as u8,
                            digit: d as u8,
                        });
                    }
                }
            }
        }

        if moves == 0 && min_size == 10 {
            return Step::Solved;
        }
        if moves > 0 {
            return Step::MadeMoves;
        }

        if self.process_box_line_reduction() > 0 {
            return Step::MadeMoves;
        }

        for cell in 0..81 {
            let mask = self.cell_masks[cell];
            if mask & mask.wrapping_sub(1) == 0 {
                continue;
            }
            let cnt = mask.count_ones() as usize;
            if cnt < min_size {
                min_size = cnt;
                min_tuple.clear();
                let mut bits = mask;
                while bits != 0 {
                    let d = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    min_tuple.push(Guess { cell: cell as u8, digit: d as u8 });
                }
            }
        }

        Step::Guess(min_tuple)
    }

    /// Eliminates along claimed lines and boxes; returns the number of
    /// eliminations.
    fn process_box_line_reduction(&mut self) -> usize {
        let claims = &*CLAIM_PATTERNS;
        let mut moves = 0;
        for boxi in 0..9 {
            let bx = 18 + boxi;
            for d in 0..9 {
                let box_mask = self.unit_masks[bx][d];
                let row_claim = claims[box_mask as usize] & 3;
                if row_claim != 0 {
                    let line = boxi / 3 * 3 + row_claim as usize - 1;
                    let mut line_mask = self.unit_masks[line][d];
                    line_mask &= !(7 << (boxi % 3 * 3));
                    moves += self.eliminate_all(line, d, line_mask);
                }
                let col_claim = claims[box_mask as usize] >> 2;
                if col_claim != 0 {
                    let line = 9 + boxi % 3 * 3 + col_claim as usize - 1;
                    let mut line_mask = self.unit_masks[line][d];
                    line_mask &= !(7 << (boxi / 3 * 3));
                    moves += self.eliminate_all(line, d, line_mask);
                }
            }
        }
        for unit_type in (0..2).rev() {
            for linei in 0..9 {
                let line = unit_type * 9 + linei;
                for d in 0..9 {
                    let line_mask = self.unit_masks[line][d];
                    let claim = claims[line_mask as usize] & 3;
                    if claim == 0 {
                        continue;
                    }
                    let box_pos = claim as usize - 1;
                    let (bx, keep);
                    if unit_type == 0 {
                        bx = 18 + linei / 3 * 3 + box_pos;
                        keep = !(7 << (linei % 3 * 3));
                    } else {
                        bx = 18 + box_pos * 3 + linei / 3;
                        keep = !(0o111 << (linei % 3));
                    }
                    let box_mask = self.unit_masks[bx][d] & keep;
                    moves += self.eliminate_all(bx, d, box_mask);
                }
            }
        }
        moves
    }

    fn eliminate_all(&mut self, unit: usize, digit: usize, mut index_mask: u16) -> usize {
        let mut moves = 0;
        while index_mask != 0 {
            let index = index_mask.trailing_zeros() as usize;
            index_mask &= index_mask - 1;
            self.eliminate(unit_cell(unit, index), digit);
            moves += 1;
        }
        moves
    }
}

impl Default for SolverBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_mask_of(board: &SolverBoard, unit: usize, d: usize) -> u16 {
        let mut mask = 0;
        for index in 0..9 {
            let cell = unit_cell(unit, index);
            if !board.is_determined(cell) && board.cell_mask(cell) >> d & 1 != 0 {
                mask |= 1 << index;
            }
        }
        mask
    }

    #[test]
    fn test_assign_propagates_peers() {
        let mut board = SolverBoard::new();
        board.assign(0, 4);
        assert_eq!(board.cell_mask(0), 1 << 4);
        // Peers lose the digit.
        assert_eq!(board.cell_mask(1) >> 4 & 1, 0);
        assert_eq!(board.cell_mask(9) >> 4 & 1, 0);
        assert_eq!(board.cell_mask(10) >> 4 & 1, 0);
        // Non-peers keep it.
        assert_eq!(board.cell_mask(30) >> 4 & 1, 1);
        assert!(!board.is_invalid());
    }

    #[test]
    fn test_unit_masks_stay_consistent() {
        let mut board = SolverBoard::new();
        board.assign(0, 0);
        board.assign(40, 3);
        board.eliminate(80, 7);
        for unit in 0..27 {
            for d in 0..9 {
                assert_eq!(board.unit_mask(unit, d), unit_mask_of(&board, unit, d));
            }
        }
    }

    #[test]
    fn test_contradiction_is_detected() {
        let mut board = SolverBoard::new();
        board.assign(0, 0);
        // Forcing the same digit into the same row contradicts.
        board.apply_mask(1, 1 << 0);
        assert!(board.is_invalid());
        assert!(matches!(board.make_step(), Step::Invalid));
    }

    #[test]
    fn test_hash_tracks_content_not_history() {
        let mut a = SolverBoard::new();
        a.assign(3, 2);
        a.assign(50, 6);
        let mut b = SolverBoard::new();
        b.assign(50, 6);
        b.assign(3, 2);
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), SolverBoard::new().hash());
    }

    #[test]
    fn test_guess_tuple_is_minimal() {
        let mut board = SolverBoard::new();
        loop {
            match board.make_step() {
                Step::MadeMoves => {}
                Step::Guess(tuple) => {
                    assert!(tuple.len() >= 2);
                    for guess in &tuple {
                        assert!(
                            board.cell_mask(guess.cell as usize) >> guess.digit & 1 != 0
                        );
                    }
                    break;
                }
                step => panic!("unexpected step on the empty board: {step:?}"),
            }
        }
    }
}
