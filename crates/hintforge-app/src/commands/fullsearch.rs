//! `fullsearch`: rate every strongly unique assignment of hint masks.
//!
//! For each mask this enumerates its strongly unique digit assignments,
//! counts the solutions of each resulting problem, and writes the
//! uniquely solvable ones at or above the rate threshold to the output
//! file. Masks are fanned out to worker threads over a bounded queue;
//! an empty mask is the shutdown signal.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::sync::Mutex;
use std::thread;

use clap::Args;
use log::{info, warn};

use hintforge_core::{CellSet, Puzzle};
use hintforge_search::BoundedQueue;
use hintforge_solver::{Solutions, UniquenessChecker, rate};

use crate::commands::strongly_unique::{box_of, for_each_assignment};
use crate::input::AppError;

/// Searches every strongly unique assignment of the masks read from
/// `--masks` or standard input, writing `problem rate` lines for
/// uniquely solvable problems rated at or above the threshold.
#[derive(Debug, Args)]
pub struct FullsearchArgs {
    /// File of 81-character mask bit strings; standard input if omitted.
    #[arg(long, value_name = "FILE")]
    masks: Option<String>,

    /// Output file for found problems.
    #[arg(long, value_name = "FILE", default_value = "output.txt")]
    output: String,

    /// Solution counter memo table size in buckets.
    #[arg(long, value_name = "BUCKETS", default_value_t = 1 << 16)]
    memo_size: usize,

    /// Minimum rate a problem must reach to be written.
    #[arg(long, value_name = "RATE", default_value_t = 10_000)]
    threshold: i64,

    /// Worker threads; defaults to the available parallelism.
    #[arg(long, value_name = "COUNT")]
    workers: Option<usize>,
}

#[derive(Default)]
struct SearchCounters {
    checked: u64,
    no_solution: u64,
    valid: u64,
}

/// Searches one mask, writing qualifying problems through the shared
/// output writer.
fn search_mask<W: Write>(
    checker: &mut UniquenessChecker,
    mask: CellSet,
    threshold: i64,
    output: &Mutex<BufWriter<W>>,
) -> io::Result<()> {
    let poses: Vec<usize> = mask.iter().collect();
    let boxes: Vec<usize> = poses.iter().map(|&pos| box_of(pos)).collect();
    let mut counters = SearchCounters::default();
    let mut write_error = None;
    for_each_assignment(&boxes, &mut |digits| {
        if write_error.is_some() {
            return;
        }
        let mut problem = Puzzle::EMPTY;
        for (&pos, &digit) in poses.iter().zip(digits) {
            problem.set_digit(pos, digit + 1);
        }
        counters.checked += 1;
        match checker.count_solutions(&problem) {
            Solutions::None => counters.no_solution += 1,
            Solutions::Many => {}
            Solutions::One => {
                counters.valid += 1;
                let rate = rate(&problem);
                if rate >= threshold {
                    let mut out = output.lock().expect("output mutex poisoned");
                    if let Err(err) = writeln!(out, "{problem} {rate}") {
                        write_error = Some(err);
                        return;
                    }
                    info!("{problem}: {rate}");
                }
            }
        }
    });
    if let Some(err) = write_error {
        return Err(err);
    }
    info!(
        "search for {mask} ended, checked: {}, no sol: {}, valid: {}",
        counters.checked, counters.no_solution, counters.valid
    );
    Ok(())
}

/// Runs the command.
///
/// # Errors
///
/// Returns any error reading the mask list or writing the output file.
pub fn run(args: &FullsearchArgs) -> Result<(), AppError> {
    let workers = args
        .workers
        .unwrap_or_else(|| thread::available_parallelism().map_or(1, std::num::NonZero::get));
    let reader: Box<dyn BufRead> = match &args.masks {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let output = Mutex::new(BufWriter::new(File::create(&args.output)?));
    let queue: BoundedQueue<CellSet> = BoundedQueue::new(workers + 1);

    let result = thread::scope(|scope| -> Result<(), AppError> {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = &queue;
            let output = &output;
            handles.push(scope.spawn(move || -> io::Result<()> {
                let mut checker = UniquenessChecker::new(args.memo_size);
                // A failed worker keeps draining so the feeder never
                // blocks on a full queue with no consumers left.
                let mut failed = None;
                loop {
                    let mask = queue.dequeue();
                    if mask.is_empty() {
                        break;
                    }
                    if failed.is_none()
                        && let Err(err) =
                            search_mask(&mut checker, mask, args.threshold, output)
                    {
                        failed = Some(err);
                    }
                }
                failed.map_or(Ok(()), Err)
            }));
        }

        let feed = |reader: Box<dyn BufRead>| -> Result<(), AppError> {
            for line in reader.lines() {
                let line = line?;
                for token in line.split_whitespace() {
                    if token.len() != 81 {
                        continue;
                    }
                    let mask: CellSet = token.parse()?;
                    if mask.is_empty() {
                        warn!("skipping empty mask");
                        continue;
                    }
                    queue.enqueue(mask);
                }
            }
            Ok(())
        };
        let fed = feed(reader);
        for _ in 0..workers {
            queue.enqueue(CellSet::EMPTY);
        }
        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        fed
    });
    result?;
    output
        .into_inner()
        .expect("output mutex poisoned")
        .flush()?;
    Ok(())
}
