//! Shared infrastructure
//!
//! The crate-wide [`MinerError`] type and the logger setup used by the binary.

/// [`MinerError`] and its conversions from channel send failures
pub mod error;

/// `env_logger` setup for mining and benchmark runs
pub mod logging;

pub use error::MinerError;
pub use logging::{init_bench_logging, init_logging};
