// src/ternary/normalize.rs
//! Bundle hash normalization used by the signing scheme

use super::{
    HASH_LENGTH, MAX_TRYTE_VALUE, MIN_TRYTE_VALUE, NORMALIZED_FRAGMENT_LENGTH,
    NUMBER_OF_SECURITY_LEVELS, TRYTE_WIDTH, Trit, Tryte,
};

/// Length of a normalized bundle hash in trytes
pub const NORMALIZED_BUNDLE_LENGTH: usize = HASH_LENGTH / TRYTE_WIDTH;

/// Normalizes a 243-trit bundle hash into 81 tryte values.
///
/// Each fragment of 27 trytes is shifted until its values sum to zero,
/// adjusting the leftmost trytes first.
pub fn normalized_bundle(hash: &[Trit]) -> [Tryte; NORMALIZED_BUNDLE_LENGTH] {
    let mut normalized = [0; NORMALIZED_BUNDLE_LENGTH];

    for (i, tryte) in normalized.iter_mut().enumerate() {
        let trits = &hash[i * TRYTE_WIDTH..(i + 1) * TRYTE_WIDTH];
        *tryte = trits[0] + trits[1] * 3 + trits[2] * 9;
    }

    for fragment in normalized
        .chunks_exact_mut(NORMALIZED_FRAGMENT_LENGTH)
        .take(NUMBER_OF_SECURITY_LEVELS)
    {
        let mut sum: i32 = fragment.iter().map(|&t| i32::from(t)).sum();

        for tryte in fragment.iter_mut() {
            while sum > 0 && *tryte > MIN_TRYTE_VALUE {
                *tryte -= 1;
                sum -= 1;
            }
            while sum < 0 && *tryte < MAX_TRYTE_VALUE {
                *tryte += 1;
                sum += 1;
            }
            if sum == 0 {
                break;
            }
        }
    }

    normalized
}
