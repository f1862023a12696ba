//! `find-ua-sets`: unavoidable sets of solution grids.

use std::io::{self, BufWriter, Write};

use clap::Args;

use hintforge_core::SolvedGrid;
use hintforge_solver::UaFinder;

use crate::input::{AppError, for_each_token};

/// Finds every unavoidable set up to the size limit for each solution
/// read from standard input. Each solution is echoed with the limit on
/// one line, followed by the set collection in its save format.
#[derive(Debug, Args)]
pub struct FindUaSetsArgs {
    /// Largest set size to search for.
    #[arg(long, value_name = "CELLS", default_value_t = 12, value_parser = clap::value_parser!(u8).range(1..=81))]
    size: u8,
}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error or output write error.
pub fn run(args: &FindUaSetsArgs) -> Result<(), AppError> {
    let size_limit = usize::from(args.size);
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    for_each_token(stdin, |token| {
        let solution: SolvedGrid = token.parse()?;
        let sets = UaFinder::find_all(&solution, size_limit);
        writeln!(out, "{solution} {size_limit}")?;
        sets.save(&mut out)?;
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
