//! Solved grids and puzzles in line format.
//!
//! Grids travel as 81-character strings, cell 0 (top-left) first, row by row.
//! A [`SolvedGrid`] holds a digit `1..=9` in every cell; a [`Puzzle`] is a
//! solved grid with some cells blanked out, written as `0` (or `.` on input).

use std::{fmt, str::FromStr};

use crate::cell_set::CellSet;

/// Error parsing a grid, puzzle, or cell mask from its line format.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseGridError {
    /// The input was not exactly 81 characters.
    #[display("expected 81 characters, found {len}")]
    Length {
        /// Actual input length.
        len: usize,
    },
    /// A cell held a character outside the accepted alphabet.
    #[display("invalid character {found:?} at cell {cell}")]
    Character {
        /// Cell index of the offending character.
        cell: usize,
        /// The character found there.
        found: char,
    },
}

/// A completely filled 9×9 grid. Every cell holds a digit `1..=9`.
///
/// Construction does not verify the Sudoku constraints; callers that need a
/// valid solution obtain one from the solver.
///
/// # Examples
///
/// ```
/// use hintforge_core::SolvedGrid;
///
/// let line: String = "123456789".repeat(9);
/// let grid: SolvedGrid = line.parse().unwrap();
/// assert_eq!(grid.digit(0), 1);
/// assert_eq!(grid.digit(80), 9);
/// assert_eq!(grid.to_string(), line);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolvedGrid([u8; 81]);

impl SolvedGrid {
    /// Creates a grid from raw digits.
    ///
    /// # Panics
    ///
    /// Panics if any digit is outside `1..=9`.
    #[must_use]
    pub fn from_digits(digits: [u8; 81]) -> Self {
        assert!(digits.iter().all(|&d| (1..=9).contains(&d)));
        Self(digits)
    }

    /// Returns the digit at `cell`.
    #[must_use]
    pub const fn digit(&self, cell: usize) -> u8 {
        self.0[cell]
    }

    /// Returns all 81 digits in cell order.
    #[must_use]
    pub const fn digits(&self) -> &[u8; 81] {
        &self.0
    }

    /// Returns the set of cells holding `digit`.
    #[must_use]
    pub fn cells_with_digit(&self, digit: u8) -> CellSet {
        (0..81).filter(|&cell| self.0[cell] == digit).collect()
    }

    /// Keeps only the cells in `mask`, producing a puzzle.
    #[must_use]
    pub fn restrict(&self, mask: CellSet) -> Puzzle {
        let mut cells = [0; 81];
        for cell in mask {
            cells[cell] = self.0[cell];
        }
        Puzzle(cells)
    }
}

impl FromStr for SolvedGrid {
    type Err = ParseGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 81 {
            return Err(ParseGridError::Length { len: bytes.len() });
        }
        let mut digits = [0; 81];
        for (cell, &b) in bytes.iter().enumerate() {
            match b {
                b'1'..=b'9' => digits[cell] = b - b'0',
                _ => return Err(ParseGridError::Character { cell, found: b as char }),
            }
        }
        Ok(Self(digits))
    }
}

impl fmt::Display for SolvedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SolvedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolvedGrid({self})")
    }
}

/// A partially filled grid: digits `1..=9` in hint cells, `0` elsewhere.
///
/// # Examples
///
/// ```
/// use hintforge_core::{CellSet, Puzzle, SolvedGrid};
///
/// let solution: SolvedGrid = "123456789".repeat(9).parse().unwrap();
/// let puzzle = solution.restrict(CellSet::from_iter([0, 80]));
/// assert_eq!(puzzle.hint_count(), 2);
/// assert_eq!(puzzle.digit(0), 1);
/// assert_eq!(puzzle.digit(1), 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Puzzle([u8; 81]);

impl Puzzle {
    /// The empty puzzle, with no hints.
    pub const EMPTY: Self = Self([0; 81]);

    /// Creates a puzzle from raw cells, `0` meaning empty.
    ///
    /// # Panics
    ///
    /// Panics if any cell is outside `0..=9`.
    #[must_use]
    pub fn from_cells(cells: [u8; 81]) -> Self {
        assert!(cells.iter().all(|&d| d <= 9));
        Self(cells)
    }

    /// Returns the digit at `cell`, `0` if the cell is empty.
    #[must_use]
    pub const fn digit(&self, cell: usize) -> u8 {
        self.0[cell]
    }

    /// Returns all 81 cells in order, `0` meaning empty.
    #[must_use]
    pub const fn cells(&self) -> &[u8; 81] {
        &self.0
    }

    /// Sets the digit at `cell`; `0` clears it.
    ///
    /// # Panics
    ///
    /// Panics if `digit > 9`.
    pub fn set_digit(&mut self, cell: usize, digit: u8) {
        assert!(digit <= 9);
        self.0[cell] = digit;
    }

    /// Returns the set of cells that hold a hint.
    #[must_use]
    pub fn hint_mask(&self) -> CellSet {
        (0..81).filter(|&cell| self.0[cell] != 0).collect()
    }

    /// Returns the number of hints.
    #[must_use]
    pub fn hint_count(&self) -> usize {
        self.0.iter().filter(|&&d| d != 0).count()
    }

    /// Returns the set of cells holding `digit`.
    ///
    /// # Panics
    ///
    /// Panics if `digit` is outside `1..=9`.
    #[must_use]
    pub fn cells_with_digit(&self, digit: u8) -> CellSet {
        assert!((1..=9).contains(&digit));
        (0..81).filter(|&cell| self.0[cell] == digit).collect()
    }

    /// Keeps only the hints in `mask`.
    #[must_use]
    pub fn restrict(&self, mask: CellSet) -> Self {
        let mut cells = [0; 81];
        for cell in mask {
            cells[cell] = self.0[cell];
        }
        Self(cells)
    }

    /// Interprets the puzzle as a solved grid.
    ///
    /// Returns `None` if any cell is empty.
    #[must_use]
    pub fn to_solved(&self) -> Option<SolvedGrid> {
        if self.0.contains(&0) {
            return None;
        }
        Some(SolvedGrid(self.0))
    }
}

impl FromStr for Puzzle {
    type Err = ParseGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 81 {
            return Err(ParseGridError::Length { len: bytes.len() });
        }
        let mut cells = [0; 81];
        for (cell, &b) in bytes.iter().enumerate() {
            match b {
                b'0' | b'.' => {}
                b'1'..=b'9' => cells[cell] = b - b'0',
                _ => return Err(ParseGridError::Character { cell, found: b as char }),
            }
        }
        Ok(Self(cells))
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Puzzle({self})")
    }
}

impl From<SolvedGrid> for Puzzle {
    fn from(grid: SolvedGrid) -> Self {
        Self(grid.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLUTION: &str =
        "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    #[test]
    fn test_solved_grid_round_trip() {
        let grid: SolvedGrid = SOLUTION.parse().unwrap();
        assert_eq!(grid.to_string(), SOLUTION);
        assert_eq!(grid.digit(0), 1);
        assert_eq!(grid.digit(9), 4);
    }

    #[test]
    fn test_solved_grid_rejects_blank() {
        let mut line = SOLUTION.to_string();
        line.replace_range(3..4, "0");
        let err = line.parse::<SolvedGrid>().unwrap_err();
        assert_eq!(err, ParseGridError::Character { cell: 3, found: '0' });
    }

    #[test]
    fn test_puzzle_parse_accepts_dots_and_zeros() {
        let mut line = SOLUTION.to_string();
        line.replace_range(0..1, ".");
        line.replace_range(1..2, "0");
        let puzzle: Puzzle = line.parse().unwrap();
        assert_eq!(puzzle.digit(0), 0);
        assert_eq!(puzzle.digit(1), 0);
        assert_eq!(puzzle.hint_count(), 79);
    }

    #[test]
    fn test_restrict_and_hint_mask() {
        let grid: SolvedGrid = SOLUTION.parse().unwrap();
        let mask = CellSet::from_iter([4, 44, 64]);
        let puzzle = grid.restrict(mask);
        assert_eq!(puzzle.hint_mask(), mask);
        for cell in mask {
            assert_eq!(puzzle.digit(cell), grid.digit(cell));
        }
    }

    #[test]
    fn test_cells_with_digit_partitions_solution() {
        let grid: SolvedGrid = SOLUTION.parse().unwrap();
        let mut seen = CellSet::EMPTY;
        for digit in 1..=9 {
            let cells = grid.cells_with_digit(digit);
            assert_eq!(cells.len(), 9);
            assert!(!seen.intersects(cells));
            seen |= cells;
        }
        assert_eq!(seen, CellSet::FULL);
    }

    #[test]
    fn test_to_solved() {
        let grid: SolvedGrid = SOLUTION.parse().unwrap();
        let full = Puzzle::from(grid);
        assert_eq!(full.to_solved(), Some(grid));
        assert_eq!(Puzzle::EMPTY.to_solved(), None);
    }
}
