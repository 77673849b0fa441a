// src/miner/scorer.rs
//! Candidate scoring
//!
//! Ranks a normalized bundle hash by how much fresh key material signing it
//! would expose. Negative normalized trytes reveal more of a key fragment, so
//! the score grows with both the depth (mean) and spread (count) of negative
//! trytes within each signed fragment.

use crate::ternary::{MAX_TRYTE_VALUE, NORMALIZED_FRAGMENT_LENGTH, Tryte};
use serde::{Deserialize, Serialize};

/// Score of a single candidate hash
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Positions already covered by previous signatures
    pub matches: usize,
    /// Distance from the no-new-exposure ideal; lower is better
    pub distance: f64,
    /// Mean of the negative trytes of each signed fragment
    pub means: Vec<f64>,
}

/// Best candidate of a round, and the progress/completion payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Nonce index that produced the bundle hash
    pub index: u64,
    /// Distance score of the normalized hash
    pub distance: f64,
    /// Per-fragment means of negative trytes
    pub means: Vec<f64>,
    /// Positions already covered by previous signatures
    pub matches: usize,
    /// Normalized bundle hash produced by this index
    pub normalized_bundle: Vec<Tryte>,
}

impl ScoredCandidate {
    /// Attaches the nonce index and normalized hash to a score
    pub fn new(index: u64, score: Score, normalized_bundle: &[Tryte]) -> Self {
        ScoredCandidate {
            index,
            distance: score.distance,
            means: score.means,
            matches: score.matches,
            normalized_bundle: normalized_bundle.to_vec(),
        }
    }
}

/// Scores a normalized bundle hash against the session thresholds.
///
/// Returns `None` when any tryte of `normalized` equals `MAX_TRYTE_VALUE`:
/// such a hash cannot be signed without revealing a whole fragment.
/// Only the first `thresholds.len()` trytes (the signed fragments) are scored.
///
/// A fragment without negative trytes contributes a mean of zero.
pub fn score_candidate(normalized: &[Tryte], thresholds: &[Tryte]) -> Option<Score> {
    debug_assert!(normalized.len() >= thresholds.len());
    debug_assert_eq!(thresholds.len() % NORMALIZED_FRAGMENT_LENGTH, 0);

    if normalized.contains(&MAX_TRYTE_VALUE) {
        return None;
    }

    let matches = normalized
        .iter()
        .zip(thresholds)
        .filter(|&(&value, &threshold)| MAX_TRYTE_VALUE - value >= threshold)
        .count();

    let mut sum = 0.0;
    let mut negatives = 0usize;
    let mut means = Vec::with_capacity(thresholds.len() / NORMALIZED_FRAGMENT_LENGTH);

    for fragment in normalized[..thresholds.len()].chunks_exact(NORMALIZED_FRAGMENT_LENGTH) {
        let (total, count) = fragment
            .iter()
            .filter(|&&v| v < 0)
            .fold((0i32, 0usize), |(total, count), &v| {
                (total + i32::from(v), count + 1)
            });

        let mean = if count == 0 {
            0.0
        } else {
            f64::from(total) / count as f64
        };
        means.push(mean);
        sum += mean * mean;
        negatives += count;
    }

    let distance = (sum + (negatives as f64).powi(3)).sqrt();

    Some(Score {
        matches,
        distance,
        means,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ternary::MIN_TRYTE_VALUE;

    fn fragment_with(negatives: &[Tryte]) -> Vec<Tryte> {
        let mut fragment = vec![0; NORMALIZED_FRAGMENT_LENGTH];
        fragment[..negatives.len()].copy_from_slice(negatives);
        fragment
    }

    #[test]
    fn test_distance_formula() {
        // Fragment 1: negatives -2, -4 (mean -3); fragment 2: -1 (mean -1).
        let mut normalized = fragment_with(&[-2, -4]);
        normalized.extend(fragment_with(&[-1]));
        normalized.extend(vec![0; NORMALIZED_FRAGMENT_LENGTH]);
        let thresholds = vec![0; 2 * NORMALIZED_FRAGMENT_LENGTH];

        let score = score_candidate(&normalized, &thresholds).unwrap();
        assert_eq!(score.means, vec![-3.0, -1.0]);
        // sqrt(9 + 1 + 3^3)
        assert!((score.distance - 37f64.sqrt()).abs() < 1e-12);
        assert_eq!(score.matches, 2 * NORMALIZED_FRAGMENT_LENGTH);
    }

    #[test]
    fn test_max_tryte_rejected_anywhere() {
        let thresholds = vec![0; NORMALIZED_FRAGMENT_LENGTH];
        let mut normalized = vec![0; 81];

        normalized[5] = MAX_TRYTE_VALUE;
        assert!(score_candidate(&normalized, &thresholds).is_none());

        // Outside the signed slice still counts.
        normalized[5] = 0;
        normalized[80] = MAX_TRYTE_VALUE;
        assert!(score_candidate(&normalized, &thresholds).is_none());
    }

    #[test]
    fn test_match_count_against_thresholds() {
        let normalized = vec![5; 81];
        let mut thresholds = vec![8; NORMALIZED_FRAGMENT_LENGTH];
        thresholds[0] = 9;
        thresholds[1] = 20;

        let score = score_candidate(&normalized, &thresholds).unwrap();
        assert_eq!(score.matches, NORMALIZED_FRAGMENT_LENGTH - 2);
    }

    #[test]
    fn test_distance_is_non_negative() {
        let thresholds = vec![0; 3 * NORMALIZED_FRAGMENT_LENGTH];
        for seed in 0..50i32 {
            let normalized: Vec<Tryte> = (0..81i32)
                .map(|i| ((i * 31 + seed * 17) % 26) as Tryte + MIN_TRYTE_VALUE)
                .collect();
            let score = score_candidate(&normalized, &thresholds).unwrap();
            assert!(score.distance >= 0.0);
            assert!(score.distance.is_finite());
        }

        let zeros = vec![0; 81];
        let score = score_candidate(&zeros, &thresholds).unwrap();
        assert_eq!(score.distance, 0.0);
        assert_eq!(score.means, vec![0.0; 3]);
    }
}
