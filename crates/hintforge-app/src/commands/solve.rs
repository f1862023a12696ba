//! `solve`: solve a stream of problems.

use std::io::{self, BufWriter, Write};

use clap::Args;

use hintforge_core::Puzzle;
use hintforge_solver::{Solutions, Solver};

use crate::input::{AppError, for_each_token};

/// Solves problems read from standard input, one `solution count` line
/// per problem. Problems without a solution print an all-zero grid.
#[derive(Debug, Args)]
pub struct SolveArgs {
    /// Solver memo table size in buckets.
    #[arg(long, value_name = "BUCKETS", default_value_t = 100_000)]
    memo_size: usize,

    /// Skip solution counting and print bare solutions.
    #[arg(long)]
    no_check: bool,

    /// Sample a random solution instead of the first found.
    #[arg(long)]
    randomize: bool,
}

fn solution_count(solutions: Solutions) -> u32 {
    match solutions {
        Solutions::None => 0,
        Solutions::One => 1,
        Solutions::Many => 2,
    }
}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error or output write error.
pub fn run(args: &SolveArgs) -> Result<(), AppError> {
    let mut solver = Solver::new(args.memo_size);
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    for_each_token(stdin, |token| {
        let problem: Puzzle = token.parse()?;
        let mut count =
            if args.no_check { 1 } else { solution_count(solver.solve(&problem)) };
        let solution = if count > 0 {
            solver.find_solution(&problem, args.randomize)
        } else {
            None
        };
        if solution.is_none() {
            count = 0;
        }
        let grid = solution
            .map_or_else(|| "0".repeat(81), |solution| solution.to_string());
        if args.no_check {
            writeln!(out, "{grid}")?;
        } else {
            writeln!(out, "{grid} {count}")?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
