// src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bundle Miner CLI - finds sweep-bundle nonces that leak the least key material
#[derive(Parser, Debug)]
#[command(name = "bundle-miner")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (mine a nonce, run benchmarks, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Search for a nonce for the configured sweep bundle
    Mine(MineOptions),

    /// Measure candidate throughput on a zero bundle
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for a mining session
#[derive(Parser, Debug)]
pub struct MineOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of worker threads to use (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Round to start searching from
    #[arg(long, conflicts_with = "resume")]
    pub offset: Option<u64>,

    /// Resume from the offset stored in the configured checkpoint file
    #[arg(long)]
    pub resume: bool,

    /// Stop searching after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Stop searching once this many rounds have been allocated
    #[arg(long)]
    pub max_rounds: Option<u64>,
}

/// Options for running throughput benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,
}
