//! Throughput and hardware statistics
//!
//! Workers report how many candidates each finished round hashed. The
//! [`StatsReporter`] folds those counts into a running hash rate and can log
//! it, together with CPU and memory usage, at a fixed interval while a
//! session or benchmark runs.

/// Counters, the hash-count listener and the periodic logger
pub mod reporter;

pub use reporter::{HardwareStats, MiningStats, StatsReporter};
