//! `canonicalize`: canonical forms of masks, solutions, and problems.

use std::fmt::Write as _;
use std::io::{self, BufWriter, Write};

use clap::{Args, ValueEnum};

use hintforge_core::{Canonicalizer, CellPermutation, CellSet, GridPermutation, Puzzle};
use hintforge_solver::{Solutions, Solver};

use crate::input::{AppError, for_each_token};

/// What kind of grid the input tokens are.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GridKind {
    /// 81-character bit strings.
    Mask,
    /// Fully solved grids.
    Solution,
    /// Problems, canonicalized as puzzles.
    Problem,
    /// Problems, canonicalized through their unique solution.
    Solved,
}

/// Prints the lexicographically minimal symmetry image of each input
/// token. `solved` canonicalizes the solution and carries the problem
/// along with the same transform, printing both on consecutive lines.
#[derive(Debug, Args)]
pub struct CanonicalizeArgs {
    /// Input interpretation.
    #[arg(value_enum)]
    kind: GridKind,

    /// Append the applied permutation to each output line.
    #[arg(long)]
    permutation: bool,
}

fn cell_perm_string(perm: &CellPermutation) -> String {
    let mut s = String::new();
    for i in 0..81 {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{}", perm.get(i));
    }
    s
}

fn grid_perm_string(perm: &GridPermutation) -> String {
    let mut s = cell_perm_string(perm.cell_perm());
    s.push_str(" |");
    for &d in perm.digit_perm() {
        let _ = write!(s, " {}", d + 1);
    }
    s
}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error, a `solved` input without a
/// unique solution, or an output write error.
pub fn run(args: &CanonicalizeArgs) -> Result<(), AppError> {
    let canonicalizer = Canonicalizer::new();
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    let show_perm = args.permutation;
    match args.kind {
        GridKind::Mask => for_each_token(stdin, |token| {
            let mask: CellSet = token.parse()?;
            let (lex_min, perm) = canonicalizer.canonicalize_mask(mask);
            if show_perm {
                writeln!(out, "{lex_min} {}", cell_perm_string(&perm))?;
            } else {
                writeln!(out, "{lex_min}")?;
            }
            Ok(())
        })?,
        GridKind::Solution => for_each_token(stdin, |token| {
            let (lex_min, perm) = canonicalizer.canonicalize_solution(&token.parse()?);
            if show_perm {
                writeln!(out, "{lex_min} {}", grid_perm_string(&perm))?;
            } else {
                writeln!(out, "{lex_min}")?;
            }
            Ok(())
        })?,
        GridKind::Problem => for_each_token(stdin, |token| {
            let (lex_min, perm) = canonicalizer.canonicalize_problem(&token.parse()?);
            if show_perm {
                writeln!(out, "{lex_min} {}", grid_perm_string(&perm))?;
            } else {
                writeln!(out, "{lex_min}")?;
            }
            Ok(())
        })?,
        GridKind::Solved => {
            let mut solver = Solver::new(0);
            for_each_token(stdin, |token| {
                let problem: Puzzle = token.parse()?;
                if solver.solve(&problem) != Solutions::One {
                    return Err(AppError::input(format!("not uniquely solvable: {token}")));
                }
                let solution = solver
                    .find_solution(&problem, false)
                    .ok_or_else(|| AppError::input(format!("unsolvable problem: {token}")))?;
                let (lex_min, perm) = canonicalizer.canonicalize_solution(&solution);
                let canonical_problem = perm.apply_to_puzzle(&problem);
                writeln!(out, "{lex_min}")?;
                if show_perm {
                    writeln!(out, "{canonical_problem} {}", grid_perm_string(&perm))?;
                } else {
                    writeln!(out, "{canonical_problem}")?;
                }
                Ok(())
            })?;
        }
    }
    out.flush()?;
    Ok(())
}
