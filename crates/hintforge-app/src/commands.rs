//! Subcommand implementations.
//!
//! Each module owns one subcommand: its clap argument struct and a `run`
//! entry point. Stream commands read grid tokens from standard input and
//! write one line per token; the search commands drive the library
//! crates and report through the log in addition to their output files.

pub mod canonicalize;
pub mod combine;
pub mod fixing;
pub mod fullsearch;
pub mod rate;
pub mod solve;
pub mod strongly_unique;
pub mod subset_search;
pub mod ua_sets;
pub mod worker;
