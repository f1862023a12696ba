//! `combine`: the distributed mask-times-solution search.
//!
//! Loads canonical hint masks and solutions, then fans the solutions
//! out to search workers running either as threads in this process or
//! as child processes over the pipe transport. Found problems above the
//! rate threshold land in the output file as `problem rate` lines.

use std::fs::File;
use std::io::BufWriter;
use std::process::Command;
use std::thread;

use clap::Args;
use log::info;

use hintforge_search::{
    DigitCountBounds, ProcessPool, SearchConfig, WorkerInit, combine_multithreaded, run_manager,
};

use crate::input::AppError;
use crate::list::{load_hint_masks, load_solutions};

const MASK_CACHE: &str = "masks_reduced.txt";
const SOLUTION_CACHE: &str = "solutions_reduced.txt";
const KNOWN_PROBLEM_CACHE: &str = "problems_reduced.txt";

/// Searches every hint mask against every solution, writing problems
/// rated at or above the threshold to the output file.
#[derive(Debug, Args)]
pub struct CombineArgs {
    /// Problem list supplying both the masks and the solutions.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["masks", "solutions"])]
    problems: Option<String>,

    /// Grid list the hint masks are taken from.
    #[arg(long, value_name = "FILE", required_unless_present = "problems")]
    masks: Option<String>,

    /// Problem list the solutions are taken from; the literal RANDOM
    /// searches self-generated random solutions instead, forever.
    #[arg(long, value_name = "FILE", required_unless_present = "problems")]
    solutions: Option<String>,

    /// Output file for found problems.
    #[arg(long, value_name = "FILE")]
    output: String,

    /// Minimum rate a problem must reach to be written.
    #[arg(long, value_name = "RATE", default_value_t = 1000)]
    threshold: i64,

    /// Largest unavoidable set size to discover per solution.
    #[arg(long, value_name = "CELLS", default_value_t = 14)]
    ua_size: usize,

    /// Uniqueness checker memo table size in buckets.
    #[arg(long, value_name = "BUCKETS", default_value_t = 100_000)]
    memo_size: usize,

    /// Worker count; defaults to the available parallelism.
    #[arg(long, value_name = "COUNT")]
    workers: Option<usize>,

    /// Smallest per-digit hint count a found mask may have.
    #[arg(long, value_name = "HINTS", default_value_t = 0)]
    digit_count_lower: usize,

    /// Largest per-digit hint count a found mask may have.
    #[arg(long, value_name = "HINTS", default_value_t = 81)]
    digit_count_upper: usize,

    /// Run workers as child processes over pipes instead of threads.
    #[arg(long)]
    process_workers: bool,
}

/// Runs the command.
///
/// # Errors
///
/// Returns any error loading the lists, spawning workers, or writing
/// the output file.
pub fn run(args: &CombineArgs) -> Result<(), AppError> {
    let mask_list = args
        .problems
        .as_deref()
        .or(args.masks.as_deref())
        .ok_or_else(|| AppError::input("a mask list is required"))?;
    let solution_list = args
        .problems
        .as_deref()
        .or(args.solutions.as_deref())
        .ok_or_else(|| AppError::input("a solution list is required"))?;
    let random_solutions = solution_list == "RANDOM";

    let hint_masks = load_hint_masks(mask_list, MASK_CACHE)?;
    let (solutions, known_problems) = if random_solutions {
        (Vec::new(), Vec::new())
    } else {
        load_solutions(solution_list, SOLUTION_CACHE, KNOWN_PROBLEM_CACHE)?
    };

    let config = SearchConfig {
        rate_threshold: args.threshold,
        ua_size: args.ua_size,
        memo_size: args.memo_size,
        digit_count_bounds: DigitCountBounds {
            lower: args.digit_count_lower,
            upper: args.digit_count_upper,
        },
        random_solutions,
    };
    let workers = args
        .workers
        .unwrap_or_else(|| thread::available_parallelism().map_or(1, std::num::NonZero::get));
    let mut output = BufWriter::new(File::create(&args.output)?);

    let summary = if args.process_workers {
        let init = WorkerInit { config, hint_masks: hint_masks.clone() };
        let exe = std::env::current_exe()?;
        let mut next_id = 0_usize;
        let pool = ProcessPool::spawn(workers, &init, move || {
            next_id += 1;
            let mut command = Command::new(&exe);
            command.arg("worker").arg("--id").arg(next_id.to_string());
            command
        })?;
        let tasks = pool.task_queue();
        let responses = pool.response_queue();
        let summary = run_manager(
            &hint_masks,
            &solutions,
            &known_problems,
            workers,
            tasks,
            responses,
            &mut output,
        )?;
        pool.wait()?;
        summary
    } else {
        combine_multithreaded(
            &hint_masks,
            &solutions,
            &known_problems,
            config,
            workers,
            &mut output,
        )?
    };
    info!("{} new problems written", summary.new_problems);
    Ok(())
}
