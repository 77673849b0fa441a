// src/miner/threshold.rs
//! Exposure threshold derivation
//!
//! Every signature already published for the address reveals, per position,
//! `MAX_TRYTE_VALUE - digit` hashing steps of the key fragment. A new bundle
//! leaks nothing extra at a position when its own transformed digit stays
//! within the most restrictive of those bounds.

use crate::ternary::{MAX_TRYTE_VALUE, Tryte};
use crate::types::SecurityLevel;
use crate::utils::error::MinerError;

/// Computes the per-position threshold vector from previously signed bundles.
///
/// `threshold[j] = min_i (MAX_TRYTE_VALUE - normalized_bundles[i][j])` over the
/// first `security_level * 27` positions.
///
/// # Errors
/// `InvalidInputLength` if no bundles are given or any bundle is shorter than
/// the signed slice.
pub fn min_normalized_bundle<B: AsRef<[Tryte]>>(
    normalized_bundles: &[B],
    security_level: SecurityLevel,
) -> Result<Vec<Tryte>, MinerError> {
    let length = security_level.normalized_length();

    if normalized_bundles.is_empty() {
        return Err(MinerError::InvalidInputLength(
            "at least one normalized bundle is required".into(),
        ));
    }
    for (i, bundle) in normalized_bundles.iter().enumerate() {
        let actual = bundle.as_ref().len();
        if actual < length {
            return Err(MinerError::InvalidInputLength(format!(
                "bundle {} has {} trytes, security level {} needs {}",
                i, actual, security_level, length
            )));
        }
    }

    let mut thresholds: Vec<Tryte> = normalized_bundles[0].as_ref()[..length]
        .iter()
        .map(|&v| MAX_TRYTE_VALUE - v)
        .collect();

    for bundle in &normalized_bundles[1..] {
        for (threshold, &v) in thresholds.iter_mut().zip(bundle.as_ref()) {
            *threshold = (*threshold).min(MAX_TRYTE_VALUE - v);
        }
    }

    Ok(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ternary::MIN_TRYTE_VALUE;

    #[test]
    fn test_single_bundle_is_mirrored() {
        let bundle: Vec<Tryte> = (0..81).map(|i| (i % 27) as Tryte - 13).collect();
        let thresholds = min_normalized_bundle(&[bundle], SecurityLevel::Low).unwrap();

        assert_eq!(thresholds.len(), 27);
        assert_eq!(thresholds[0], MAX_TRYTE_VALUE - MIN_TRYTE_VALUE);
        assert_eq!(thresholds[26], 0);
    }

    #[test]
    fn test_threshold_is_minimum_over_bundles() {
        let first: Vec<Tryte> = (0..81).map(|i| ((i * 7) % 27) as Tryte - 13).collect();
        let second: Vec<Tryte> = (0..81).map(|i| ((i * 11 + 5) % 27) as Tryte - 13).collect();
        let bundles = [first, second];

        for level in [SecurityLevel::Low, SecurityLevel::Medium, SecurityLevel::High] {
            let thresholds = min_normalized_bundle(&bundles, level).unwrap();
            assert_eq!(thresholds.len(), level.normalized_length());

            for (j, &threshold) in thresholds.iter().enumerate() {
                assert!(bundles.iter().all(|b| threshold <= MAX_TRYTE_VALUE - b[j]));
                assert!(bundles.iter().any(|b| threshold == MAX_TRYTE_VALUE - b[j]));
            }
        }
    }

    #[test]
    fn test_rejects_short_bundles() {
        let short = vec![0 as Tryte; 53];
        assert!(matches!(
            min_normalized_bundle(&[short], SecurityLevel::Medium),
            Err(MinerError::InvalidInputLength(_))
        ));

        let none: [Vec<Tryte>; 0] = [];
        assert!(matches!(
            min_normalized_bundle(&none, SecurityLevel::Medium),
            Err(MinerError::InvalidInputLength(_))
        ));
    }
}
