// src/cli/mod.rs
//! Command-line interface
//!
//! Argument definitions for the `mine`, `benchmark` and `config` subcommands.

/// Subcommand and option definitions
pub mod commands;

pub use commands::{Action, BenchmarkOptions, Commands, ConfigOptions, MineOptions};
