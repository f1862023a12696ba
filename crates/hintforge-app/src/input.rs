//! Shared input plumbing for the stream-oriented subcommands.
//!
//! Most commands read whitespace-separated 81-character grid tokens from
//! standard input and write one result line per token. Malformed tokens
//! stop the run with an error rather than being skipped, so a corrupt
//! list is noticed instead of silently thinned out.

use std::io::{self, BufRead};

use derive_more::{Display, Error, From};
use hintforge_core::ParseGridError;
use hintforge_solver::LoadUaError;

/// Errors surfaced to the command line.
#[derive(Debug, Display, Error, From)]
pub enum AppError {
    /// An input or output stream failed.
    Io(io::Error),
    /// A grid or mask token did not parse.
    Grid(ParseGridError),
    /// An unavoidable set cache did not parse.
    UaCache(LoadUaError),
    /// A well-formed token violated a command precondition.
    #[display("invalid input: {reason}")]
    #[from(skip)]
    Input {
        /// What the token failed to satisfy.
        reason: String,
    },
}

impl AppError {
    /// A precondition failure described by `reason`.
    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input { reason: reason.into() }
    }
}

/// Calls `f` for every whitespace-separated token of `reader`.
///
/// # Errors
///
/// Returns the first read error or the first error from `f`.
pub fn for_each_token<R: BufRead>(
    reader: R,
    mut f: impl FnMut(&str) -> Result<(), AppError>,
) -> Result<(), AppError> {
    for line in reader.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            f(token)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_across_lines_and_spaces() {
        let data = "abc def\n\n  ghi\n".as_bytes();
        let mut seen = Vec::new();
        for_each_token(data, |token| {
            seen.push(token.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, ["abc", "def", "ghi"]);
    }

    #[test]
    fn callback_errors_stop_the_stream() {
        let data = "one two three".as_bytes();
        let mut seen = 0;
        let result = for_each_token(data, |token| {
            seen += 1;
            if token == "two" { Err(AppError::input("boom")) } else { Ok(()) }
        });
        assert!(result.is_err());
        assert_eq!(seen, 2);
    }
}
