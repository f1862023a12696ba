//! `worker`: the hidden child-process entry of the combine search.
//!
//! Reads the startup payload from standard input, builds the search
//! diagram, and then speaks the framed pipe protocol on the same pair
//! of pipes until the end task arrives. All logging goes to standard
//! error; standard output carries frames only.

use std::io;

use clap::Args;

use hintforge_search::{RowPermutationDiagram, SearchWorker, WorkerInit, worker_endpoints};

use crate::input::AppError;

/// Runs one combine search worker over standard input and output.
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Worker slot, starting at 1; slot 1 reports the configuration.
    #[arg(long, default_value_t = 1)]
    id: usize,
}

/// Runs the worker until its end task arrives.
///
/// # Errors
///
/// Returns an error if the startup payload cannot be read.
pub fn run(args: &WorkerArgs) -> Result<(), AppError> {
    let mut stdin = io::stdin().lock();
    let init = WorkerInit::read_from(&mut stdin)?;
    let diagram = RowPermutationDiagram::build(&init.hint_masks);
    let stdout = io::stdout().lock();
    let (tasks, responses) = worker_endpoints(stdin, stdout);
    SearchWorker::new(args.id, &diagram, init.hint_masks.len(), init.config, tasks, responses)
        .run();
    Ok(())
}
