// src/config/config.rs
use crate::miner::MinerParams;
use crate::ternary::{HASH_LENGTH, normalized_bundle, trytes_to_trits};
use crate::transaction::{TRANSACTION_LENGTH, TRANSACTION_TRYTES_LENGTH};
use crate::types::SecurityLevel;
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for a mining session
///
/// Describes the reuse case (bundle hashes already signed by the address and
/// the bundle that sweeps it) plus how hard and how wide to search.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Bundle hashes (81 trytes each) already signed by the address
    pub signed_bundle_hashes: Vec<String>,

    /// Sweep bundle moving the funds off the address
    pub bundle: BundleSource,

    /// Distance below which the search stops
    /// (default: 100)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Security level of the address
    /// (default: 2)
    #[serde(default)]
    pub security_level: SecurityLevel,

    /// Number of worker threads to use for mining
    /// (default: number of CPU cores)
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Nonces each worker searches per round
    /// (default: 1000)
    #[serde(default = "default_batch_size")]
    pub values_per_worker_round: u64,

    /// File the search offset is persisted to for resuming
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
}

/// Where the sweep bundle comes from
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleSource {
    /// Transaction trytes (2673 per transaction), in bundle order
    Trytes(Vec<String>),

    /// A zero-filled bundle of this many transactions
    Empty(usize),
}

fn default_threshold() -> f64 {
    100.0
}

fn default_worker_threads() -> usize {
    num_cpus::get()
}

fn default_batch_size() -> u64 {
    1000
}

impl BundleSource {
    /// Decodes the bundle into trits
    pub fn to_trits(&self) -> Result<Vec<i8>, MinerError> {
        match self {
            BundleSource::Trytes(transactions) => {
                let mut trits = Vec::with_capacity(transactions.len() * TRANSACTION_LENGTH);
                for (i, transaction) in transactions.iter().enumerate() {
                    if transaction.len() != TRANSACTION_TRYTES_LENGTH {
                        return Err(MinerError::ConfigError(format!(
                            "Transaction {} has {} trytes, expected {}",
                            i,
                            transaction.len(),
                            TRANSACTION_TRYTES_LENGTH
                        )));
                    }
                    trits.extend(trytes_to_trits(transaction)?);
                }
                Ok(trits)
            }
            BundleSource::Empty(count) => {
                let length = count.checked_mul(TRANSACTION_LENGTH).ok_or_else(|| {
                    MinerError::ConfigError(format!(
                        "Empty bundle of {} transactions is too large",
                        count
                    ))
                })?;
                Ok(vec![0; length])
            }
        }
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&config_str)
    }

    /// Parses configuration from TOML text
    pub fn parse(config_str: &str) -> Result<Self, MinerError> {
        toml::from_str(config_str)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Builds session parameters, normalizing the signed bundle hashes
    pub fn to_params(&self) -> Result<MinerParams, MinerError> {
        let normalized_bundles = self
            .signed_bundle_hashes
            .iter()
            .map(|hash| {
                let trits = trytes_to_trits(hash)?;
                if trits.len() != HASH_LENGTH {
                    return Err(MinerError::ConfigError(format!(
                        "Bundle hash {} is not {} trytes",
                        hash,
                        HASH_LENGTH / 3
                    )));
                }
                Ok(normalized_bundle(&trits).to_vec())
            })
            .collect::<Result<Vec<_>, MinerError>>()?;

        Ok(MinerParams {
            normalized_bundles,
            bundle: self.bundle.to_trits()?,
            threshold: self.threshold,
            security_level: self.security_level.into(),
            number_of_workers: self.worker_threads,
            values_per_worker_round: self.values_per_worker_round,
        })
    }

    /// Generates a configuration template string
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template() -> String {
        let mut template = String::new();
        template.push_str("# Bundle Miner Configuration\n\n");
        template.push_str("# Bundle hashes already signed by the reused address (81 trytes each)\n");
        template.push_str("signed_bundle_hashes = [\n");
        template.push_str("    \"QVXRKNRXFZIPFPREXRAPNHNSRFFQOWBGCAFZEGFCKDPDXRNVZQ9VJPQPPTFXKPVZVAIENQLETXRVSFKFO\",\n");
        template.push_str("]\n");
        template.push_str("# Stop once a bundle scores below this distance\n");
        template.push_str("threshold = 100.0\n");
        template.push_str("# Security level of the address (1, 2 or 3)\n");
        template.push_str("security_level = 2\n");
        template.push_str("# Number of worker threads\n");
        template.push_str(&format!("worker_threads = {}\n", num_cpus::get()));
        template.push_str("# Nonces searched by a worker per round\n");
        template.push_str("values_per_worker_round = 1000\n");
        template.push_str("# Offset checkpoint for resuming\n");
        template.push_str("checkpoint = \"miner.offset\"\n\n");
        template.push_str("# Sweep bundle: either transaction trytes...\n");
        template.push_str("# [bundle]\n");
        template.push_str("# trytes = [\"<2673 trytes>\", \"<2673 trytes>\"]\n");
        template.push_str("# ...or a zero-filled bundle for testing\n");
        template.push_str("[bundle]\n");
        template.push_str("empty = 4\n");

        template
    }
}

/// Reads a persisted search offset; a missing file means no checkpoint
pub fn read_checkpoint(path: &Path) -> Result<Option<u64>, MinerError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.trim().parse().map(Some).map_err(|e| {
            MinerError::ConfigError(format!("Invalid checkpoint {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persists a search offset
pub fn write_checkpoint(path: &Path, offset: u64) -> Result<(), MinerError> {
    std::fs::write(path, format!("{}\n", offset))?;
    Ok(())
}
