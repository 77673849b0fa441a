// src/transaction.rs
//! Transaction trit layout
//!
//! Only the fields the miner touches are described here: the essence region
//! that feeds the bundle hash and the obsolete tag that carries the nonce.

use crate::ternary::{Trit, trits_to_trytes, write_value_trits};
use crate::utils::error::MinerError;

/// Length of one transaction in trits
pub const TRANSACTION_LENGTH: usize = 8019;
/// Length of a transaction in trytes
pub const TRANSACTION_TRYTES_LENGTH: usize = TRANSACTION_LENGTH / 3;

/// Signature or message fragment
pub const SIGNATURE_OR_MESSAGE_LENGTH: usize = 6561;
/// Address field
pub const ADDRESS_LENGTH: usize = 243;
/// Value field
pub const VALUE_LENGTH: usize = 81;
/// Obsolete tag field, reused as the mined nonce
pub const OBSOLETE_TAG_LENGTH: usize = 81;
/// Issuance timestamp field
pub const ISSUANCE_TIMESTAMP_LENGTH: usize = 27;
/// Current index field
pub const CURRENT_INDEX_LENGTH: usize = 27;
/// Last index field
pub const LAST_INDEX_LENGTH: usize = 27;

/// Offset of the address, where the essence begins
pub const ADDRESS_OFFSET: usize = SIGNATURE_OR_MESSAGE_LENGTH;

/// Essence of a single transaction: address through last index
pub const TRANSACTION_ESSENCE_LENGTH: usize = ADDRESS_LENGTH
    + VALUE_LENGTH
    + OBSOLETE_TAG_LENGTH
    + ISSUANCE_TIMESTAMP_LENGTH
    + CURRENT_INDEX_LENGTH
    + LAST_INDEX_LENGTH;

/// Position of the nonce (first obsolete tag) inside the bundle essence
pub const ESSENCE_NONCE_OFFSET: usize = ADDRESS_LENGTH + VALUE_LENGTH;

/// Whether `length` trits form a whole, non-empty number of transactions
pub fn is_multiple_of_transaction_length(length: usize) -> bool {
    length >= TRANSACTION_LENGTH && length % TRANSACTION_LENGTH == 0
}

/// Essence of the transaction starting at `offset`
pub fn transaction_essence(bundle: &[Trit], offset: usize) -> &[Trit] {
    let start = offset + ADDRESS_OFFSET;
    &bundle[start..start + TRANSACTION_ESSENCE_LENGTH]
}

/// Writes a nonce index into an essence buffer
pub fn set_essence_nonce(essence: &mut [Trit], index: u64) -> Result<(), MinerError> {
    write_value_trits(
        &mut essence[ESSENCE_NONCE_OFFSET..ESSENCE_NONCE_OFFSET + OBSOLETE_TAG_LENGTH],
        index,
    )
}

/// Obsolete tag trytes the first transaction needs for a mined index
pub fn obsolete_tag_trytes(index: u64) -> Result<String, MinerError> {
    let mut tag = [0; OBSOLETE_TAG_LENGTH];
    write_value_trits(&mut tag, index)?;
    trits_to_trytes(&tag)
}
