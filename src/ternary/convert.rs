// src/ternary/convert.rs
//! Conversions between tryte strings, trits and integers.

use super::{MAX_TRYTE_VALUE, TRYTE_WIDTH, Trit, Tryte};
use crate::utils::error::MinerError;

/// Tryte alphabet; index `i` encodes value `i` for `i <= 13`, `i - 27` above.
pub const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Decodes a tryte string into trits (three trits per tryte, least significant first)
pub fn trytes_to_trits(trytes: &str) -> Result<Vec<Trit>, MinerError> {
    let mut trits = Vec::with_capacity(trytes.len() * TRYTE_WIDTH);

    for (position, c) in trytes.chars().enumerate() {
        let value = tryte_value(c).ok_or_else(|| {
            MinerError::InputError(format!("Invalid tryte '{}' at position {}", c, position))
        })?;
        trits.extend_from_slice(&tryte_to_trits(value));
    }

    Ok(trits)
}

/// Encodes trits as a tryte string
///
/// # Errors
/// `InputError` if the trit count is not a multiple of three or a trit is out of range.
pub fn trits_to_trytes(trits: &[Trit]) -> Result<String, MinerError> {
    if trits.len() % TRYTE_WIDTH != 0 {
        return Err(MinerError::InputError(format!(
            "Trit count {} is not a multiple of {}",
            trits.len(),
            TRYTE_WIDTH
        )));
    }

    trits
        .chunks_exact(TRYTE_WIDTH)
        .map(|chunk| {
            if chunk.iter().any(|t| !(-1..=1).contains(t)) {
                return Err(MinerError::InputError(format!("Invalid trits {:?}", chunk)));
            }
            let value = chunk[0] + chunk[1] * 3 + chunk[2] * 9;
            Ok(tryte_char(value))
        })
        .collect()
}

/// Balanced-ternary value of a tryte character
pub fn tryte_value(c: char) -> Option<Tryte> {
    TRYTE_ALPHABET
        .iter()
        .position(|&a| a as char == c)
        .map(|i| i as Tryte)
        .map(|v| if v > MAX_TRYTE_VALUE { v - 27 } else { v })
}

fn tryte_char(value: Tryte) -> char {
    let index = if value < 0 { value + 27 } else { value };
    TRYTE_ALPHABET[index as usize] as char
}

fn tryte_to_trits(value: Tryte) -> [Trit; TRYTE_WIDTH] {
    let mut trits = [0; TRYTE_WIDTH];
    fill_balanced(&mut trits, u64::from(value.unsigned_abs()));
    if value < 0 {
        trits.iter_mut().for_each(|t| *t = -*t);
    }
    trits
}

/// Converts an integer to its shortest balanced-ternary trit sequence.
///
/// Zero produces an empty sequence.
pub fn value_to_trits(value: i64) -> Vec<Trit> {
    let mut trits = Vec::new();
    let mut magnitude = value.unsigned_abs();

    while magnitude > 0 {
        let (trit, rest) = balanced_digit(magnitude);
        trits.push(trit);
        magnitude = rest;
    }

    if value < 0 {
        trits.iter_mut().for_each(|t| *t = -*t);
    }
    trits
}

/// Writes `value` into `dest` as zero-padded balanced trits.
///
/// # Errors
/// `InputError` if `dest` is too short to hold the value.
pub fn write_value_trits(dest: &mut [Trit], value: u64) -> Result<(), MinerError> {
    if fill_balanced(dest, value) {
        Ok(())
    } else {
        Err(MinerError::InputError(format!(
            "Value {} does not fit in {} trits",
            value,
            dest.len()
        )))
    }
}

/// Reads a little-endian balanced trit sequence back into an integer
pub fn trits_to_value(trits: &[Trit]) -> i64 {
    trits
        .iter()
        .rev()
        .fold(0i64, |acc, &t| acc * 3 + i64::from(t))
}

// Returns false when the magnitude did not fit.
fn fill_balanced(dest: &mut [Trit], mut magnitude: u64) -> bool {
    for slot in dest.iter_mut() {
        let (trit, rest) = balanced_digit(magnitude);
        *slot = trit;
        magnitude = rest;
    }
    magnitude == 0
}

fn balanced_digit(magnitude: u64) -> (Trit, u64) {
    match magnitude % 3 {
        2 => (-1, magnitude / 3 + 1),
        r => (r as Trit, magnitude / 3),
    }
}
