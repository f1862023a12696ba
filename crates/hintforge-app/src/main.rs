//! Command line interface for the hintforge puzzle search toolkit.
//!
//! Stream commands (`solve`, `rate`, `canonicalize`, `find-ua-sets`,
//! `fixing-symmetries`, `strongly-unique`) read whitespace-separated
//! 81-character grid tokens from standard input. The search commands
//! (`subset-search`, `fullsearch`, `combine`) drive the library crates
//! across worker threads or child processes. Logging goes to standard
//! error and is controlled through `RUST_LOG`.

use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod input;
mod list;

use crate::input::AppError;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve a stream of problems.
    Solve(commands::solve::SolveArgs),
    /// Rate a stream of problems.
    Rate(commands::rate::RateArgs),
    /// Canonicalize a stream of masks, solutions, or problems.
    Canonicalize(commands::canonicalize::CanonicalizeArgs),
    /// Find the unavoidable sets of a stream of solutions.
    FindUaSets(commands::ua_sets::FindUaSetsArgs),
    /// Enumerate the hint permutations fixing each mask.
    FixingSymmetries(commands::fixing::FixingSymmetriesArgs),
    /// Enumerate the strongly unique digit assignments of each mask.
    StronglyUnique(commands::strongly_unique::StronglyUniqueArgs),
    /// Sample random supersets and list their uniquely solvable subsets.
    SubsetSearch(commands::subset_search::SubsetSearchArgs),
    /// Rate every strongly unique assignment of a mask list.
    Fullsearch(commands::fullsearch::FullsearchArgs),
    /// Run the distributed mask-times-solution search.
    Combine(commands::combine::CombineArgs),
    #[command(hide = true)]
    Worker(commands::worker::WorkerArgs),
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Command::Solve(args) => commands::solve::run(args),
        Command::Rate(args) => commands::rate::run(args),
        Command::Canonicalize(args) => commands::canonicalize::run(args),
        Command::FindUaSets(args) => commands::ua_sets::run(args),
        Command::FixingSymmetries(args) => commands::fixing::run(args),
        Command::StronglyUnique(args) => commands::strongly_unique::run(args),
        Command::SubsetSearch(args) => commands::subset_search::run(args),
        Command::Fullsearch(args) => commands::fullsearch::run(args),
        Command::Combine(args) => commands::combine::run(args),
        Command::Worker(args) => commands::worker::run(args),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
