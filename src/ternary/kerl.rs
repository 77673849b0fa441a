// src/ternary/kerl.rs
//! Kerl sponge implementation
//!
//! Kerl wraps Keccak-384 so it can absorb and squeeze balanced trits:
//! - Each 243-trit chunk is read as a signed integer (the last trit is ignored)
//! - The integer is absorbed as 48 big-endian two's complement bytes
//! - Squeezed digests are mapped back to 242 balanced trits plus a zero trit

use super::{HASH_LENGTH, Sponge, Trit};
use crate::utils::error::MinerError;
use sha3::{Digest, Keccak384};
use std::sync::LazyLock;
use uint::construct_uint;

const BYTE_LENGTH: usize = 48;

construct_uint! {
    struct U384(6);
}

/// 3^242
static POW3: LazyLock<U384> =
    LazyLock::new(|| U384::from(3u64).pow(U384::from(HASH_LENGTH - 1)));

/// (3^242 - 1) / 2, the largest magnitude representable in 242 balanced trits
static HALF_3: LazyLock<U384> = LazyLock::new(|| (*POW3 - 1u64) >> 1usize);

/// Kerl sponge over Keccak-384
#[derive(Clone, Default)]
pub struct Kerl {
    keccak: Keccak384,
}

impl Kerl {
    /// Creates a fresh sponge
    pub fn new() -> Self {
        Kerl {
            keccak: Keccak384::new(),
        }
    }
}

impl Sponge for Kerl {
    fn absorb(&mut self, trits: &[Trit]) -> Result<(), MinerError> {
        check_length(trits.len())?;

        for chunk in trits.chunks_exact(HASH_LENGTH) {
            self.keccak.update(trits_to_bytes(chunk));
        }
        Ok(())
    }

    fn squeeze(&mut self, trits: &mut [Trit]) -> Result<(), MinerError> {
        check_length(trits.len())?;

        for chunk in trits.chunks_exact_mut(HASH_LENGTH) {
            let mut digest = [0u8; BYTE_LENGTH];
            digest.copy_from_slice(&self.keccak.clone().finalize());
            chunk.copy_from_slice(&bytes_to_trits(&digest));

            digest.iter_mut().for_each(|b| *b = !*b);
            self.keccak = Keccak384::new();
            self.keccak.update(digest);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.keccak = Keccak384::new();
    }
}

fn check_length(length: usize) -> Result<(), MinerError> {
    if length == 0 || length % HASH_LENGTH != 0 {
        return Err(MinerError::HashError(format!(
            "Kerl length {} is not a positive multiple of {}",
            length, HASH_LENGTH
        )));
    }
    Ok(())
}

/// Two's complement negation modulo 2^384
fn negate(value: U384) -> U384 {
    U384::zero().overflowing_sub(value).0
}

/// Converts one 243-trit chunk into 48 big-endian bytes
fn trits_to_bytes(trits: &[Trit]) -> [u8; BYTE_LENGTH] {
    let half = *HALF_3;

    // Offset by HALF_3 so every digit is non-negative.
    let base = trits[..HASH_LENGTH - 1]
        .iter()
        .rev()
        .fold(U384::zero(), |acc, &trit| acc * 3u64 + (trit + 1) as u64);

    let value = if base >= half {
        base - half
    } else {
        negate(half - base)
    };

    value.to_big_endian()
}

/// Maps a 48-byte signed digest onto the balanced residue modulo 3^242
fn bytes_to_trits(bytes: &[u8; BYTE_LENGTH]) -> [Trit; HASH_LENGTH] {
    let (pow3, half) = (*POW3, *HALF_3);
    let value = U384::from_big_endian(bytes);

    // Digits of (value + HALF_3) mod 3^242, minus one, are the balanced trits.
    let mut base = if !value.bit(BYTE_LENGTH * 8 - 1) {
        let shifted = value + half;
        if shifted >= pow3 { shifted - pow3 } else { shifted }
    } else {
        let magnitude = negate(value);
        if magnitude <= half {
            half - magnitude
        } else {
            pow3 - (magnitude - half)
        }
    };

    let three = U384::from(3u64);
    let mut trits = [0; HASH_LENGTH];
    for trit in trits[..HASH_LENGTH - 1].iter_mut() {
        let (quotient, remainder) = base.div_mod(three);
        base = quotient;
        *trit = remainder.low_u64() as Trit - 1;
    }
    trits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ternary::{trits_to_trytes, trytes_to_trits};

    #[test]
    fn test_half_3_doubles_to_pow3() {
        assert_eq!(*HALF_3 + *HALF_3 + 1u64, *POW3);
        assert!(POW3.bit(383), "3^242 sits above 2^383");
        assert_eq!(POW3.div_mod(U384::from(3u64)).1, U384::zero());
    }

    #[test]
    fn test_kerl_known_vector() {
        let input =
            trytes_to_trits("EMIDYNHBWMBCXVDEFOFWINXTERALUKYYPPHKP9JJFGJEIUY9MUDVNFZHMMWZUYUSWAIOWEVTHNWMHANBH")
                .unwrap();
        let mut kerl = Kerl::new();
        let mut output = vec![0; HASH_LENGTH];
        kerl.absorb(&input).unwrap();
        kerl.squeeze(&mut output).unwrap();

        assert_eq!(
            trits_to_trytes(&output).unwrap(),
            "EJEAOOZYSAWFPZQESYDHZCGYNSTWXUMVJOVDWUNZJXDGWCLUFGIMZRMGCAZGKNPLBRLGUNYWKLJTYEAQX"
        );
    }

    #[test]
    fn test_byte_conversion_preserves_value() {
        let patterns: [fn(usize) -> Trit; 4] = [
            |_| -1,
            |_| 1,
            |i| (i % 3) as Trit - 1,
            |i| if i % 7 == 0 { -1 } else { 0 },
        ];

        for pattern in patterns {
            let mut trits = [0; HASH_LENGTH];
            for (i, trit) in trits[..HASH_LENGTH - 1].iter_mut().enumerate() {
                *trit = pattern(i);
            }
            assert_eq!(bytes_to_trits(&trits_to_bytes(&trits)), trits);
        }
    }

    #[test]
    fn test_negative_values_are_twos_complement() {
        let mut minus_one = [0; HASH_LENGTH];
        minus_one[0] = -1;
        assert_eq!(trits_to_bytes(&minus_one), [0xff; BYTE_LENGTH]);

        let mut one = [0; HASH_LENGTH];
        one[0] = 1;
        let bytes = trits_to_bytes(&one);
        assert_eq!(bytes[BYTE_LENGTH - 1], 1);
        assert!(bytes[..BYTE_LENGTH - 1].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rejects_partial_chunks() {
        let mut kerl = Kerl::new();
        assert!(matches!(kerl.absorb(&[0; 242]), Err(MinerError::HashError(_))));
        assert!(matches!(kerl.absorb(&[]), Err(MinerError::HashError(_))));
        let mut out = [0; 100];
        assert!(kerl.squeeze(&mut out).is_err());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let input = [1; HASH_LENGTH];
        let mut first = [0; HASH_LENGTH];
        let mut second = [0; HASH_LENGTH];

        let mut kerl = Kerl::new();
        kerl.absorb(&input).unwrap();
        kerl.squeeze(&mut first).unwrap();
        kerl.reset();
        kerl.absorb(&input).unwrap();
        kerl.squeeze(&mut second).unwrap();

        assert_eq!(first, second);
        assert_eq!(first[HASH_LENGTH - 1], 0);
    }
}
