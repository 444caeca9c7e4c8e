//! CLI module for checkfactor - command-line interface and subcommands.
//!
//! Provides one-shot status reports, a watch mode that re-polls the run,
//! and lookups of the images each direction has produced.

pub mod commands;

pub use commands::Cli;
