//! Cached loading of hint mask and solution lists.
//!
//! Both loaders bring their input to canonical form and drop duplicates,
//! which is the expensive part of starting a combine run. The reduced
//! lists are written to cache files whose first line names the source
//! file; a rerun over the same list reads the cache and skips the
//! canonicalization pass entirely.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
};

use log::info;

use hintforge_core::{Canonicalizer, CellSet, Puzzle, SolvedGrid};
use hintforge_solver::Solver;

use crate::input::AppError;

/// Opens `path` and returns a reader positioned after the signature line
/// when that line matches `source`.
fn open_matching_cache(path: &str, source: &str) -> Option<BufReader<File>> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut first = String::new();
    reader.read_line(&mut first).ok()?;
    (first.trim() == source).then_some(reader)
}

fn write_cache<T: std::fmt::Display>(path: &str, source: &str, items: &[T]) -> Result<(), AppError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{source}")?;
    for item in items {
        writeln!(writer, "{item}")?;
    }
    writer.flush()?;
    Ok(())
}

fn hint_mask_of(token: &str) -> Result<CellSet, AppError> {
    let mut mask = CellSet::new();
    for (cell, c) in token.bytes().enumerate() {
        match c {
            b'0' | b'.' => {}
            b'1'..=b'9' => mask.insert(cell),
            _ => return Err(AppError::input(format!("unexpected character in grid: {token}"))),
        }
    }
    Ok(mask)
}

/// Loads the hint masks of the grids in `list`, canonicalized and
/// deduplicated, going through `cache` when its signature matches.
///
/// Tokens that are not 81 characters long are skipped, so the list may
/// carry comment or count lines.
///
/// # Errors
///
/// Returns an error if `list` cannot be read, a grid token holds an
/// unexpected character, or the cache cannot be rewritten.
pub fn load_hint_masks(list: &str, cache: &str) -> Result<Vec<CellSet>, AppError> {
    if let Some(reader) = open_matching_cache(cache, list) {
        info!("loading masks (cached)");
        let mut masks = Vec::new();
        for line in reader.lines() {
            let line = line?;
            for token in line.split_whitespace() {
                masks.push(token.parse()?);
            }
        }
        info!("{} masks loaded", masks.len());
        return Ok(masks);
    }

    info!("loading masks");
    let canonicalizer = Canonicalizer::new();
    let mut masks = Vec::new();
    let mut seen = HashSet::new();
    let mut dups = 0_usize;
    let reader = BufReader::new(File::open(list)?);
    for line in reader.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            if token.len() != 81 {
                continue;
            }
            let (lex_min, _) = canonicalizer.canonicalize_mask(hint_mask_of(token)?);
            if seen.insert(lex_min) {
                masks.push(lex_min);
            } else {
                dups += 1;
            }
        }
    }
    write_cache(cache, list, &masks)?;
    info!("{} masks loaded, {dups} duplicates dropped", masks.len());
    Ok(masks)
}

/// Loads the solutions of the problems in `list`, canonicalized and
/// deduplicated, along with the canonical form of every input problem.
///
/// The known problem set lets a combine run recognize rediscoveries of
/// its own seed problems. Both outputs are cached under the same source
/// signature; a stale known-problem cache next to a fresh solution cache
/// is an error rather than a silent mismatch.
///
/// # Errors
///
/// Returns an error if `list` cannot be read, a grid has no solution,
/// or either cache cannot be rewritten.
pub fn load_solutions(
    list: &str,
    cache: &str,
    known_cache: &str,
) -> Result<(Vec<SolvedGrid>, Vec<Puzzle>), AppError> {
    if let Some(reader) = open_matching_cache(cache, list) {
        info!("loading solutions (cached)");
        let mut solutions = Vec::new();
        for line in reader.lines() {
            let line = line?;
            for token in line.split_whitespace() {
                solutions.push(token.parse()?);
            }
        }
        let known_reader = open_matching_cache(known_cache, list).ok_or_else(|| {
            AppError::input(format!("known problem cache {known_cache} does not match {list}"))
        })?;
        let mut known = Vec::new();
        for line in known_reader.lines() {
            let line = line?;
            for token in line.split_whitespace() {
                known.push(token.parse()?);
            }
        }
        info!("{} solutions loaded", solutions.len());
        return Ok((solutions, known));
    }

    info!("loading solutions");
    let canonicalizer = Canonicalizer::new();
    let mut solver = Solver::new(0);
    let mut solutions = Vec::new();
    let mut solution_set = HashSet::new();
    let mut known_set = HashSet::new();
    let mut dups = 0_usize;
    let reader = BufReader::new(File::open(list)?);
    for line in reader.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            if token.len() != 81 {
                continue;
            }
            let problem: Puzzle = token.parse()?;
            let (canonical_problem, _) = canonicalizer.canonicalize_problem(&problem);
            known_set.insert(canonical_problem);
            let solution = solver
                .find_solution(&problem, false)
                .ok_or_else(|| AppError::input(format!("unsolvable problem: {token}")))?;
            let (lex_min, _) = canonicalizer.canonicalize_solution(&solution);
            if solution_set.insert(lex_min) {
                solutions.push(lex_min);
            } else {
                dups += 1;
            }
        }
    }
    let known: Vec<Puzzle> = known_set.into_iter().collect();
    write_cache(cache, list, &solutions)?;
    write_cache(known_cache, list, &known)?;
    info!("{} solutions loaded, {dups} duplicates dropped", solutions.len());
    Ok((solutions, known))
}
