// src/config/mod.rs
//! Session configuration
//!
//! A TOML file describes one address reuse case: the bundle hashes the address
//! already signed, the sweep bundle, and how the search should run. The
//! checkpoint helpers persist the search offset between runs.

/// [`Config`], [`BundleSource`] and the checkpoint helpers
pub mod config;

pub use config::{BundleSource, Config, read_checkpoint, write_checkpoint};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Reads and parses a configuration file
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Commented template for `bundle-miner config`
pub fn generate_template() -> String {
    Config::generate_template()
}
