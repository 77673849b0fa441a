// src/utils/error.rs
use crate::miner::worker::WorkerCommand;
use serde_json;
use std::io;
use thiserror::Error;

/// Main error type for the bundle miner
///
/// Covers construction-time validation, session control misuse, failures
/// reported by worker threads, and errors from the surrounding application
/// (configuration, I/O, serialization).
#[derive(Error, Debug)]
pub enum MinerError {
    /// A normalized bundle (or the set of them) has an unusable length
    #[error("Illegal normalized bundle length: {0}")]
    InvalidInputLength(String),

    /// The sweep bundle is not a whole number of transactions
    #[error("Illegal bundle length: {0}")]
    InvalidBundleLength(usize),

    /// Security level outside 1..=3
    #[error("Illegal security level: {0}")]
    InvalidSecurityLevel(u8),

    /// `start` was called while a search is running
    #[error("Search is already running")]
    AlreadyRunning,

    /// A worker thread failed while hashing or scoring
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailure {
        /// Index of the failed worker
        worker: usize,
        /// Description of the underlying error
        reason: String,
    },

    /// Sponge misuse (e.g. lengths that are not whole hash blocks)
    #[error("Hash error: {0}")]
    HashError(String),

    /// Invalid user input (bad trytes, out-of-range values)
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Converts failed sends of round assignments into MinerError
///
/// Happens when a worker thread has already exited.
impl From<crossbeam_channel::SendError<WorkerCommand>> for MinerError {
    fn from(e: crossbeam_channel::SendError<WorkerCommand>) -> Self {
        MinerError::ChannelError(format!("Worker command send failed: {}", e))
    }
}
