// src/types.rs
use crate::ternary::NORMALIZED_FRAGMENT_LENGTH;
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Security level of the address being swept
///
/// The level is the number of key fragments used when signing, and so the
/// number of normalized fragments the miner has to compare.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SecurityLevel {
    /// One key fragment
    Low = 1,
    /// Two fragments, the wallet default
    #[default]
    Medium = 2,
    /// Three fragments
    High = 3,
}

impl SecurityLevel {
    /// Number of normalized fragments covered by this level
    pub fn fragments(self) -> usize {
        self as usize
    }

    /// Trytes of a normalized bundle hash signed at this level
    pub fn normalized_length(self) -> usize {
        self.fragments() * NORMALIZED_FRAGMENT_LENGTH
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = MinerError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(SecurityLevel::Low),
            2 => Ok(SecurityLevel::Medium),
            3 => Ok(SecurityLevel::High),
            other => Err(MinerError::InvalidSecurityLevel(other)),
        }
    }
}

impl From<SecurityLevel> for u8 {
    fn from(level: SecurityLevel) -> Self {
        level as u8
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl FromStr for SecurityLevel {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = s
            .trim()
            .parse::<u8>()
            .map_err(|_| MinerError::InputError(format!("Unknown security level: {}", s)))?;
        SecurityLevel::try_from(level)
    }
}
