//! Unavoidable-set enumeration.
//!
//! An unavoidable set of a solution is a set of cells that every hint mask
//! must intersect: blanking the whole set leaves a second completion.
//! [`UaFinder`] enumerates, up to a size limit, the minimal such sets by
//! searching for alternative completions with the propagation board and
//! recording where they deviate from the reference solution.
//!
//! Collections are cached on disk in a line-oriented text format (see
//! [`UaSets::save`]) because enumeration dominates start-up time.

use std::io::{self, BufRead, Write};

use hintforge_core::{CellSet, SolvedGrid};
use log::debug;

use crate::board::{SolverBoard, Step};

/// Unavoidable sets smaller than this cannot exist.
const MIN_UA_SIZE: usize = 4;

/// Error from parsing a cached collection.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadUaError {
    /// Underlying read failed.
    #[display("read failed: {_0}")]
    Io(io::Error),
    /// The cache text does not follow the expected layout.
    #[display("malformed unavoidable-set cache at line {line}")]
    #[from(skip)]
    Malformed {
        /// One-based line number of the offending line.
        line: usize,
    },
}

/// Unavoidable sets grouped by size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UaSets {
    sets: Vec<Vec<CellSet>>,
}

impl UaSets {
    fn with_max_size(max_size: usize) -> Self {
        Self { sets: vec![Vec::new(); max_size + 1] }
    }

    /// Largest size the collection covers.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.sets.len() - 1
    }

    /// Sets of exactly `size` cells.
    #[must_use]
    pub fn of_size(&self, size: usize) -> &[CellSet] {
        &self.sets[size]
    }

    /// All sets, smallest sizes first.
    pub fn iter(&self) -> impl Iterator<Item = CellSet> + '_ {
        self.sets.iter().flatten().copied()
    }

    /// Total number of sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }

    /// `true` when no set was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(Vec::is_empty)
    }

    /// Records `set`, discarding any stored superset of it.
    fn add(&mut self, set: CellSet) {
        let size = set.len();
        self.sets[size].push(set);
        for larger in &mut self.sets[size + 1..] {
            larger.retain(|&stored| !set.is_subset_of(stored));
        }
    }

    /// `true` when some stored set of size at most `limit` is contained in
    /// `mask`.
    fn contains_subset_of(&self, mask: CellSet, limit: usize) -> bool {
        (MIN_UA_SIZE..=limit.min(self.max_size()))
            .any(|size| self.sets[size].iter().any(|s| s.is_subset_of(mask)))
    }

    /// Writes the cache: the maximum size, then per size a count line, the
    /// sets as space-separated cell indices, and a blank separator line.
    pub fn save<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.max_size())?;
        for size in MIN_UA_SIZE..=self.max_size() {
            writeln!(writer, "{}", self.sets[size].len())?;
            for set in &self.sets[size] {
                let cells: Vec<String> = set.iter().map(|c| c.to_string()).collect();
                writeln!(writer, "{}", cells.join(" "))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Reads a cache written by [`UaSets::save`].
    pub fn load<R: BufRead>(reader: &mut R) -> Result<Self, LoadUaError> {
        let mut lines = reader.lines().enumerate();
        let mut next = |expect_line: bool| -> Result<(usize, String), LoadUaError> {
            match lines.next() {
                Some((i, line)) => Ok((i + 1, line?)),
                None if expect_line => Err(LoadUaError::Malformed { line: 0 }),
                None => Ok((0, String::new())),
            }
        };

        let (line, text) = next(true)?;
        let max_size: usize = text
            .trim()
            .parse()
            .map_err(|_| LoadUaError::Malformed { line })?;
        let mut sets = Self::with_max_size(max_size);
        for size in MIN_UA_SIZE..=max_size {
            let (line, text) = next(true)?;
            let count: usize = text
                .trim()
                .parse()
                .map_err(|_| LoadUaError::Malformed { line })?;
            for _ in 0..count {
                let (line, text) = next(true)?;
                let mut set = CellSet::EMPTY;
                for token in text.split_whitespace() {
                    let cell: usize = token
                        .parse()
                        .ok()
                        .filter(|&c| c < 81)
                        .ok_or(LoadUaError::Malformed { line })?;
                    set.insert(cell);
                }
                if set.len() != size {
                    return Err(LoadUaError::Malformed { line });
                }
                sets.sets[size].push(set);
            }
            next(false)?;
        }
        Ok(sets)
    }
}

/// Depth-first enumerator of unavoidable sets.
pub struct UaFinder {
    solution_masks: [u16; 81],
    size_limit: usize,
    sets: UaSets,
}

impl UaFinder {
    /// Enumerates the unavoidable sets of `solution` with at most
    /// `size_limit` cells.
    #[must_use]
    pub fn find_all(solution: &SolvedGrid, size_limit: usize) -> UaSets {
        let mut solution_masks = [0u16; 81];
        for (cell, mask) in solution_masks.iter_mut().enumerate() {
            *mask = 1 << (solution.digit(cell) - 1);
        }
        let mut finder = Self {
            solution_masks,
            size_limit,
            sets: UaSets::with_max_size(size_limit),
        };
        finder.dfs(SolverBoard::new());
        debug!(
            "found {} unavoidable sets of size <= {}",
            finder.sets.len(),
            size_limit
        );
        finder.sets
    }

    fn dfs(&mut self, mut board: SolverBoard) {
        loop {
            let Some(ua_set) = self.deviation_set(&board) else {
                return;
            };
            if ua_set.len() == self.size_limit {
                // No further deviation fits the limit; lock the rest to the
                // solution.
                for cell in (!ua_set).iter() {
                    board.apply_mask(cell, self.solution_masks[cell]);
                }
            }
            match board.make_step() {
                Step::Invalid => return,
                Step::Solved => {
                    if !ua_set.is_empty() {
                        self.sets.add(ua_set);
                    }
                    return;
                }
                Step::MadeMoves => {}
                Step::Guess(mut tuple) => {
                    // Visit the solution-conforming branch first so its
                    // subtree is recorded before deviations are pruned
                    // against it.
                    if let Some(pos) = tuple.iter().position(|g| {
                        self.solution_masks[g.cell as usize] >> g.digit & 1 != 0
                    }) {
                        tuple.swap(0, pos);
                    }
                    for guess in &tuple {
                        let mut child = board.clone();
                        child.assign(guess.cell as usize, guess.digit as usize);
                        self.dfs(child);
                    }
                    return;
                }
            }
        }
    }

    /// The cells where `board` excludes the solution digit, or `None` when
    /// this branch cannot yield a new set within the limit.
    fn deviation_set(&self, board: &SolverBoard) -> Option<CellSet> {
        let mut ua_set = CellSet::EMPTY;
        let mut unit_counts = [[0u8; 9]; 3];
        let mut digit_counts = [0u8; 9];
        for cell in 0..81 {
            if board.cell_mask(cell) & self.solution_masks[cell] != 0 {
                continue;
            }
            ua_set.insert(cell);
            unit_counts[0][cell / 9] += 1;
            unit_counts[1][cell % 9] += 1;
            unit_counts[2][cell / 9 / 3 * 3 + cell % 9 / 3] += 1;
            digit_counts[self.solution_masks[cell].trailing_zeros() as usize] += 1;
        }

        // A unit or digit with a single deviating cell needs at least one
        // more deviation before the board can close into a new completion.
        let singles = |counts: &[u8; 9]| counts.iter().filter(|&&c| c == 1).count();
        let lower_bound = unit_counts
            .iter()
            .map(singles)
            .max()
            .unwrap_or(0)
            .max(singles(&digit_counts));
        if ua_set.len() + lower_bound > self.size_limit {
            return None;
        }
        if self.sets.contains_subset_of(ua_set, ua_set.len()) {
            return None;
        }
        Some(ua_set)
    }
}

#[cfg(test)]
mod tests {
    use hintforge_core::Puzzle;

    use super::*;
    use crate::solver::{Solutions, Solver};

    const SOLUTION: &str = "123456789456789123789123456214365897365897214897214365531642978642978531978531642";

    fn solution() -> SolvedGrid {
        SOLUTION.parse().unwrap()
    }

    #[test]
    fn test_finds_a_known_deadly_rectangle() {
        // Rows 0 and 3 start with 1 2 / 2 1 across two blocks.
        let sets = UaFinder::find_all(&solution(), 4);
        let rectangle: CellSet = [0usize, 1, 27, 28].into_iter().collect();
        assert!(sets.of_size(4).contains(&rectangle));
    }

    #[test]
    fn test_found_sets_are_unavoidable() {
        let sets = UaFinder::find_all(&solution(), 4);
        assert!(!sets.is_empty());
        let mut solver = Solver::new(1 << 14);
        for set in sets.iter() {
            let problem = solution().restrict(!set);
            assert_eq!(solver.solve(&problem), Solutions::Many);
        }
    }

    #[test]
    fn test_no_stored_set_contains_another() {
        let sets = UaFinder::find_all(&solution(), 5);
        let all: Vec<CellSet> = sets.iter().collect();
        for (i, &a) in all.iter().enumerate() {
            for (j, &b) in all.iter().enumerate() {
                if i != j {
                    assert!(!a.is_subset_of(b), "{a} is contained in {b}");
                }
            }
        }
    }

    #[test]
    fn test_cache_round_trip() {
        let sets = UaFinder::find_all(&solution(), 4);
        let mut buffer = Vec::new();
        sets.save(&mut buffer).unwrap();
        let loaded = UaSets::load(&mut buffer.as_slice()).unwrap();
        assert_eq!(loaded, sets);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut garbage: &[u8] = b"4\nnot a number\n";
        assert!(matches!(
            UaSets::load(&mut garbage),
            Err(LoadUaError::Malformed { .. })
        ));
        let mut truncated: &[u8] = b"5\n1\n0 1 27 28\n";
        assert!(UaSets::load(&mut truncated).is_err());
    }

    #[test]
    fn test_blanking_outside_all_sets_is_safe() {
        // A single blank that misses every size-4 set keeps the solution
        // recoverable.
        let sets = UaFinder::find_all(&solution(), 4);
        let mut solver = Solver::new(1 << 12);
        let mut mask = CellSet::FULL;
        mask.remove(2);
        if !sets.iter().any(|s| s.contains(2)) {
            let problem = solution().restrict(mask);
            assert_eq!(solver.solve(&problem), Solutions::One);
        } else {
            let problem = Puzzle::from(solution());
            assert_eq!(solver.solve(&problem), Solutions::One);
        }
    }
}
