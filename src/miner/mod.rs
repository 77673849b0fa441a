// src/miner/mod.rs
//! Core search functionality
//!
//! This module contains all components of the nonce search:
//! - Threshold and essence preparation
//! - Candidate scoring
//! - Worker threads and the orchestrating session

/// Threshold vector derivation from previously signed bundles
pub mod threshold;

/// Essence extraction from the sweep bundle
pub mod essence;

/// Candidate scoring against the threshold vector
pub mod scorer;

/// Worker thread implementation
///
/// Workers receive round assignments, search their nonce range and report the
/// best candidate of each round.
pub mod worker;

/// Session orchestration
///
/// Owns the worker pool, allocates rounds and publishes progress, completion
/// and error events.
pub mod orchestrator;

// Re-export main components for cleaner imports
pub use self::essence::bundle_essence;
pub use self::orchestrator::{BundleMiner, MinerEvent, MinerParams};
pub use self::scorer::{Score, ScoredCandidate, score_candidate};
pub use self::threshold::min_normalized_bundle;
pub use self::worker::{SearchWorker, SpongeFactory, WorkerState};
