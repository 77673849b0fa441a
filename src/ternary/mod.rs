// src/ternary/mod.rs
//! Balanced-ternary primitives consumed by the miner
//!
//! This module contains everything the search engine needs from the ternary world:
//! - Trit/tryte encodings and integer conversions
//! - The sponge interface and its Kerl implementation
//! - Bundle hash normalization

/// Tryte string and integer conversions
pub mod convert;

/// Keccak-384 backed ternary sponge
pub mod kerl;

/// Normalization of bundle hashes
pub mod normalize;

pub use self::convert::{
    trits_to_trytes, trits_to_value, trytes_to_trits, value_to_trits, write_value_trits,
};
pub use self::kerl::Kerl;
pub use self::normalize::{NORMALIZED_BUNDLE_LENGTH, normalized_bundle};

use crate::utils::error::MinerError;

/// A balanced trit: -1, 0 or 1
pub type Trit = i8;

/// A tryte value in `MIN_TRYTE_VALUE..=MAX_TRYTE_VALUE`
pub type Tryte = i8;

/// Trits per tryte
pub const TRYTE_WIDTH: usize = 3;
/// Smallest tryte value
pub const MIN_TRYTE_VALUE: Tryte = -13;
/// Largest tryte value
pub const MAX_TRYTE_VALUE: Tryte = 13;
/// Length of a hash in trits
pub const HASH_LENGTH: usize = 243;
/// Trytes per normalized fragment (one per security level)
pub const NORMALIZED_FRAGMENT_LENGTH: usize = 27;
/// Number of fragments in a normalized bundle hash
pub const NUMBER_OF_SECURITY_LEVELS: usize = 3;

/// Common interface for ternary sponge functions
///
/// The miner only needs absorb/squeeze over whole hash-length blocks plus a
/// reset so one instance can be reused for every candidate.
pub trait Sponge: Send {
    /// Absorbs trits; the length must be a positive multiple of [`HASH_LENGTH`]
    fn absorb(&mut self, trits: &[Trit]) -> Result<(), MinerError>;

    /// Squeezes trits into `trits`; the length must be a positive multiple of [`HASH_LENGTH`]
    fn squeeze(&mut self, trits: &mut [Trit]) -> Result<(), MinerError>;

    /// Returns the sponge to its initial state
    fn reset(&mut self);
}
