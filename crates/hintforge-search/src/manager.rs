//! Manager loop distributing solutions to workers.
//!
//! The manager dispatches one solution per idle worker, broadcasts end
//! tasks once the list is exhausted, and collects found problems into
//! the output, skipping any problem already known. Per-pattern valid
//! problem counts reported by ending workers are accumulated and logged.

use std::collections::HashSet;
use std::io::{self, Write};
use std::thread;

use hintforge_core::{CellSet, Puzzle, SolvedGrid};
use hintforge_solver::squash_rate;
use log::{debug, info};

use crate::diagram::RowPermutationDiagram;
use crate::message::{Response, SearchConfig, Task};
use crate::queue::{InProcessResponseQueue, InProcessTaskQueue, ResponseQueue, TaskQueue};
use crate::worker::SearchWorker;

/// Totals reported after a combine run.
#[derive(Clone, Debug, Default)]
pub struct CombineSummary {
    /// Problems written to the output this run.
    pub new_problems: usize,
    /// Accumulated valid problem counts, one per hint pattern.
    pub valid_counts: Vec<u64>,
}

/// Feeds `solutions` to workers and drains their responses until every
/// worker has ended. Found problems not in `known_problems` are written
/// to `output` as `problem rate` lines.
///
/// # Errors
///
/// Returns any error from writing to `output`.
pub fn run_manager<T: TaskQueue, R: ResponseQueue, W: Write>(
    hint_masks: &[CellSet],
    solutions: &[SolvedGrid],
    known_problems: &[Puzzle],
    workers: usize,
    mut tasks: T,
    mut responses: R,
    output: &mut W,
) -> io::Result<CombineSummary> {
    info!("number of workers: {workers}");

    let mut known: HashSet<Puzzle> = known_problems.iter().copied().collect();
    let mut summary = CombineSummary {
        new_problems: 0,
        valid_counts: vec![0; hint_masks.len()],
    };
    let mut count_reports = 0_u64;
    let mut next_solution = 0;
    let mut end_sent = false;
    let mut ended_workers = 0;

    while ended_workers < workers {
        match responses.dequeue() {
            Response::WorkerIdle => {
                if next_solution < solutions.len() {
                    tasks.enqueue(Task::Search {
                        solution: solutions[next_solution],
                    });
                    next_solution += 1;
                    if next_solution == solutions.len() {
                        for _ in 0..workers {
                            tasks.enqueue(Task::End);
                        }
                        end_sent = true;
                    }
                } else if !end_sent {
                    // An empty solution list still has to shut the
                    // workers down.
                    for _ in 0..workers {
                        tasks.enqueue(Task::End);
                    }
                    end_sent = true;
                }
            }
            Response::WorkerEnded => ended_workers += 1,
            Response::FoundProblem { problem, rate } => {
                if known.insert(problem) {
                    writeln!(output, "{problem} {rate}")?;
                    summary.new_problems += 1;
                    info!("{problem}: {}s", squash_rate(rate));
                } else {
                    debug!("{problem} is already known");
                }
            }
            Response::AddValidCounts { counts } => {
                for (total, count) in summary.valid_counts.iter_mut().zip(&counts) {
                    *total += count;
                }
                count_reports += 1;
                if count_reports % workers as u64 == 0
                    || count_reports as usize == solutions.len()
                {
                    let mut table = format!("number of valid problems ({count_reports}):");
                    for (mask, total) in hint_masks.iter().zip(&summary.valid_counts) {
                        table.push_str(&format!("\n{}: {total}", mask.to_bit_string()));
                    }
                    info!("{table}");
                }
            }
            Response::LogInfo { text } => info!("{text}"),
        }
    }
    output.flush()?;
    Ok(summary)
}

/// Runs a combine with `workers` in-process worker threads.
///
/// In random-solution mode this never returns; workers generate
/// solutions forever and the manager keeps draining their findings.
///
/// # Errors
///
/// Returns any error from writing to `output`.
///
/// # Panics
///
/// Panics if `workers` is zero.
pub fn combine_multithreaded<W: Write>(
    hint_masks: &[CellSet],
    solutions: &[SolvedGrid],
    known_problems: &[Puzzle],
    config: SearchConfig,
    workers: usize,
    output: &mut W,
) -> io::Result<CombineSummary> {
    assert!(workers > 0, "combine requires at least one worker");
    info!("building row permutation diagram");
    let diagram = RowPermutationDiagram::build(hint_masks);

    let tasks = InProcessTaskQueue::new(solutions.len() + 1 + workers);
    let responses = InProcessResponseQueue::new(workers * 10);

    thread::scope(|scope| {
        for id in 0..workers {
            let tasks = tasks.clone();
            let responses = responses.clone();
            let diagram = &diagram;
            scope.spawn(move || {
                SearchWorker::new(id + 1, diagram, hint_masks.len(), config, tasks, responses)
                    .run();
            });
        }
        run_manager(
            hint_masks,
            solutions,
            known_problems,
            workers,
            tasks.clone(),
            responses.clone(),
            output,
        )
    })
}
