//! `subset-search`: uniquely solvable subsets of random supersets.
//!
//! For each solution this draws random supersets of a fixed size and
//! enumerates every subset within the hint count bounds whose
//! restriction of the solution is uniquely solvable. Unavoidable sets
//! drive the pruning, so their discovery cost can be amortized through
//! a cache file keyed by solution and size limit.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use clap::Args;
use log::info;
use rand::seq::SliceRandom;
use rand::{SeedableRng, TryRng, rngs::SysRng};
use rand_pcg::Pcg64Mcg;

use hintforge_core::{CellSet, Puzzle, SolvedGrid};
use hintforge_search::SubsetSearcher;
use hintforge_solver::{UaFinder, UaSets, rate};

use crate::input::{AppError, for_each_token};

/// Samples random supersets of each solution read from standard input
/// and prints every new uniquely solvable subset within the hint count
/// bounds as a `problem rate` line.
#[derive(Debug, Args)]
pub struct SubsetSearchArgs {
    /// Smallest hint count to keep.
    #[arg(long, value_name = "HINTS", default_value_t = 18)]
    lower: usize,

    /// Largest hint count to keep.
    #[arg(long, value_name = "HINTS", default_value_t = 23)]
    upper: usize,

    /// Cells per sampled superset, at most 64.
    #[arg(long, value_name = "CELLS", default_value_t = 40, value_parser = clap::value_parser!(u8).range(1..=64))]
    superset_size: u8,

    /// Largest unavoidable set size to discover.
    #[arg(long, value_name = "CELLS", default_value_t = 20)]
    ua_size: usize,

    /// Supersets to sample per solution; 0 keeps sampling forever.
    #[arg(long, value_name = "COUNT", default_value_t = 1000)]
    rounds: u64,

    /// Uniqueness checker memo table size in buckets.
    #[arg(long, value_name = "BUCKETS", default_value_t = 100_000)]
    memo_size: usize,

    /// Unavoidable set cache file, keyed by solution and size limit.
    #[arg(long, value_name = "FILE")]
    ua_cache: Option<String>,
}

/// Loads the unavoidable sets of `solution` from `cache` when its
/// header matches, recomputing and rewriting the cache otherwise.
fn ua_sets_for(
    solution: &SolvedGrid,
    ua_size: usize,
    cache: Option<&str>,
) -> Result<UaSets, AppError> {
    let header = format!("{solution} {ua_size}");
    if let Some(path) = cache
        && let Ok(file) = File::open(path)
    {
        let mut reader = BufReader::new(file);
        let mut first = String::new();
        reader.read_line(&mut first)?;
        if first.trim() == header {
            info!("loading unavoidable sets (cached)");
            return Ok(UaSets::load(&mut reader)?);
        }
    }
    let sets = UaFinder::find_all(solution, ua_size);
    if let Some(path) = cache {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{header}")?;
        sets.save(&mut writer)?;
        writer.flush()?;
    }
    Ok(sets)
}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error, cache error, or output write
/// error.
pub fn run(args: &SubsetSearchArgs) -> Result<(), AppError> {
    if args.lower > args.upper {
        return Err(AppError::input("lower bound exceeds upper bound"));
    }
    let superset_size = usize::from(args.superset_size);
    let mut searcher = SubsetSearcher::new(args.memo_size);
    let mut seed = [0u8; 16];
    SysRng
        .try_fill_bytes(&mut seed)
        .map_err(|err| AppError::input(format!("operating system rng unavailable: {err}")))?;
    let mut rng = Pcg64Mcg::from_seed(seed);
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    for_each_token(stdin, |token| {
        let solution: SolvedGrid = token.parse()?;
        let ua_sets = ua_sets_for(&solution, args.ua_size, args.ua_cache.as_deref())?;
        searcher.set_solution(&solution, &ua_sets);

        let mut seen: HashSet<Puzzle> = HashSet::new();
        let mut cells: Vec<usize> = (0..81).collect();
        let mut round = 0_u64;
        while args.rounds == 0 || round < args.rounds {
            round += 1;
            let (chosen, _) = cells.partial_shuffle(&mut rng, superset_size);
            let superset: CellSet = chosen.iter().copied().collect();
            if !searcher.set_superset(superset) {
                continue;
            }
            for problem in searcher.search(args.lower..=args.upper) {
                if seen.insert(problem) {
                    writeln!(out, "{problem} {}", rate(&problem))?;
                }
            }
            out.flush()?;
        }
        info!("{} problems found for {solution}", seen.len());
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
