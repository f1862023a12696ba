//! Core types for symmetry-aware sudoku puzzle discovery.
//!
//! This crate provides the grid primitives and the group-theoretic layer the
//! rest of the workspace builds on: positions, hint masks, the grid symmetry
//! group, and canonical forms under it.
//!
//! # Overview
//!
//! - [`cell_set`]: [`CellSet`], the 81-bit set of cell positions every other
//!   component trades in.
//! - [`grid`]: [`SolvedGrid`] and [`Puzzle`], grids in 81-character line
//!   format with boundary validation.
//! - [`symmetry`]: [`CellPermutation`] and iteration of the 3,359,232-element
//!   grid symmetry group and its column-only subgroup.
//! - [`rows`]: [`RowView`], the row/band reading of a mask, with orbit
//!   enumeration and symmetry-class orders.
//! - [`canonical`]: [`Canonicalizer`], lexicographically minimal
//!   representatives for masks, solved grids, and partial grids, with
//!   recovered transforms.
//! - [`fixing`]: enumeration of the hint-index permutations induced by
//!   symmetries fixing a pattern.
//!
//! # Examples
//!
//! ```
//! use hintforge_core::{Canonicalizer, CellSet};
//!
//! let canon = Canonicalizer::new();
//! let mask: CellSet = "101000000000000000000000000000000000000000000000000\
//!                      000000000000000000000000000001"
//!     .parse()
//!     .unwrap();
//! let (rep, transform) = canon.canonicalize_mask(mask);
//! assert_eq!(transform.apply_to_set(mask), rep);
//! ```

pub mod canonical;
pub mod cell_set;
pub mod fixing;
pub mod grid;
pub mod rows;
pub mod symmetry;

pub use self::{
    canonical::{Canonicalizer, GridPermutation},
    cell_set::CellSet,
    grid::{ParseGridError, Puzzle, SolvedGrid},
    rows::RowView,
    symmetry::CellPermutation,
};
