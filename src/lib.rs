//! Bundle Miner - nonce search for sweeping reused IOTA addresses
//!
//! When a WOTS address has already signed bundles, every further signature
//! reveals more of its private key. This crate searches the obsolete-tag
//! nonce of the sweep bundle for a bundle hash whose signature leaks as
//! little new key material as possible:
//! - Threshold derivation from previously signed bundle hashes
//! - Kerl hashing and bundle normalization
//! - A multi-threaded, resumable search with progress events
//! - Hardware and throughput monitoring

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation including scoring, workers and orchestration
pub mod miner;

/// Ternary primitives: conversions, Kerl and normalization
pub mod ternary;

/// Transaction layout constants and helpers
pub mod transaction;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{BundleMiner, MinerEvent, MinerParams, ScoredCandidate};
pub use stats::{HardwareStats, MiningStats, StatsReporter};
pub use ternary::{Kerl, Sponge};
pub use types::SecurityLevel;
pub use utils::{MinerError, init_logging};
