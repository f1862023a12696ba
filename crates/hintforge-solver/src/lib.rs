//! Solving, uniqueness checking, and rating.
//!
//! Two solver cores share this crate. [`SolverBoard`] is a candidate board
//! with eager propagation driving the backtracking [`Solver`] and the
//! unavoidable-set enumerator [`UaFinder`]. [`UniquenessChecker`] is a
//! bitboard oracle tuned for the one question the searcher asks millions of
//! times: does this hint mask admit a completion other than the known
//! solution? [`rate`] scores problems by the search effort they force.
//!
//! ```
//! use hintforge_core::{Puzzle, SolvedGrid};
//! use hintforge_solver::{Solutions, Solver};
//!
//! let solution: SolvedGrid = "\
//!     123456789456789123789123456\
//!     214365897365897214897214365\
//!     531642978642978531978531642"
//!     .parse()?;
//! let problem = solution.restrict(!solution.cells_with_digit(5));
//! let mut solver = Solver::new(1 << 10);
//! assert_eq!(solver.solve(&problem), Solutions::One);
//! assert_eq!(solver.find_solution(&problem, false), Some(solution));
//! # Ok::<(), hintforge_core::ParseGridError>(())
//! ```

pub mod board;
pub mod memo;
pub mod oracle;
pub mod rate;
pub mod solver;
pub mod tables;
pub mod ua;

pub use self::board::{Guess, GuessTuple, SolverBoard, Step};
pub use self::memo::MemoTable;
pub use self::oracle::{DigitBoards, UniquenessChecker};
pub use self::rate::{MAX_SQUASHED_RATE, rate, squash_rate, unsquash_rate};
pub use self::solver::{Solutions, Solver};
pub use self::ua::{LoadUaError, UaFinder, UaSets};
