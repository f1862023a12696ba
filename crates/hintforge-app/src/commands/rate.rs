//! `rate`: rate a stream of problems.

use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Args;
use log::info;
use rayon::prelude::*;

use hintforge_core::Puzzle;
use hintforge_solver::{Solutions, Solver, rate, squash_rate};

use crate::input::{AppError, for_each_token};

/// Rates problems read from standard input, one
/// `problem rate squashed` line per problem. Problems without a unique
/// solution rate as -1.
#[derive(Debug, Args)]
pub struct RateArgs {
    /// Solver memo table size in buckets.
    #[arg(long, value_name = "BUCKETS", default_value_t = 100_000)]
    memo_size: usize,

    /// Skip the uniqueness check before rating.
    #[arg(long)]
    no_check: bool,

    /// Worker threads; above one the whole input is read up front.
    #[arg(long, value_name = "COUNT", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=1024))]
    threads: u32,
}

fn rate_one(solver: &mut Solver, problem: &Puzzle, no_check: bool) -> i64 {
    if !no_check && solver.solve(problem) != Solutions::One {
        return -1;
    }
    rate(problem)
}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error or output write error.
pub fn run(args: &RateArgs) -> Result<(), AppError> {
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    if args.threads == 1 {
        let mut solver = Solver::new(args.memo_size);
        for_each_token(stdin, |token| {
            let problem: Puzzle = token.parse()?;
            let rate = rate_one(&mut solver, &problem, args.no_check);
            writeln!(out, "{problem} {rate} {}", squash_rate(rate))?;
            Ok(())
        })?;
        out.flush()?;
        return Ok(());
    }

    let mut problems = Vec::new();
    for_each_token(stdin, |token| {
        problems.push(token.parse::<Puzzle>()?);
        Ok(())
    })?;
    info!("{} problems", problems.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads as usize)
        .build()
        .map_err(|err| AppError::input(err.to_string()))?;
    let progress = AtomicUsize::new(0);
    let total = problems.len().max(1);
    let rates: Vec<i64> = pool.install(|| {
        problems
            .par_iter()
            .map_init(
                || Solver::new(args.memo_size),
                |solver, problem| {
                    let rate = rate_one(solver, problem, args.no_check);
                    let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                    if done * 10 / total != (done - 1) * 10 / total {
                        info!("{done} / {total} rated");
                    }
                    rate
                },
            )
            .collect()
    });
    for (problem, &rate) in problems.iter().zip(&rates) {
        writeln!(out, "{problem} {rate} {}", squash_rate(rate))?;
    }
    out.flush()?;
    Ok(())
}
