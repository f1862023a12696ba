//! `fixing-symmetries`: hint permutations induced by mask symmetries.

use std::io::{self, BufWriter, Write};

use clap::Args;

use hintforge_core::CellSet;
use hintforge_core::fixing::enumerate_fixing_symmetries;

use crate::input::{AppError, for_each_token};

/// Enumerates, for each mask read from standard input, the permutations
/// of its hint cells induced by symmetries mapping the mask onto
/// itself. The first output line reports `dup` or `nodup` (whether
/// distinct symmetries collapsed onto one hint permutation) and the
/// permutation count; each following line shows the permuted mask and
/// the hint index images.
#[derive(Debug, Args)]
pub struct FixingSymmetriesArgs {}

/// Runs the command against standard input and output.
///
/// # Errors
///
/// Returns the first input parse error or output write error.
pub fn run(_args: &FixingSymmetriesArgs) -> Result<(), AppError> {
    let stdin = io::stdin().lock();
    let mut out = BufWriter::new(io::stdout().lock());
    for_each_token(stdin, |token| {
        let mask: CellSet = token.parse()?;
        let hint_poses: Vec<usize> = mask.iter().collect();
        let symmetries = enumerate_fixing_symmetries(mask);
        writeln!(
            out,
            "{} {}",
            if symmetries.degenerate { "dup" } else { "nodup" },
            symmetries.permutations.len()
        )?;
        for perm in &symmetries.permutations {
            let mut permuted = vec![b'0'; 81];
            for (i, &pos) in hint_poses.iter().enumerate() {
                permuted[hint_poses[perm.get(i)]] = token.as_bytes()[pos];
            }
            write!(out, "{}", String::from_utf8_lossy(&permuted))?;
            for i in 0..hint_poses.len() {
                write!(out, " {}", perm.get(i))?;
            }
            writeln!(out)?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
