// src/miner/essence.rs
//! Bundle essence extraction

use crate::ternary::Trit;
use crate::transaction::{
    TRANSACTION_ESSENCE_LENGTH, TRANSACTION_LENGTH, is_multiple_of_transaction_length,
    transaction_essence,
};
use crate::utils::error::MinerError;

/// Concatenates the essence of every transaction in the bundle, in order.
///
/// # Errors
/// `InvalidBundleLength` unless the bundle is a non-empty whole number of transactions.
pub fn bundle_essence(bundle: &[Trit]) -> Result<Vec<Trit>, MinerError> {
    if !is_multiple_of_transaction_length(bundle.len()) {
        return Err(MinerError::InvalidBundleLength(bundle.len()));
    }

    let mut essence =
        Vec::with_capacity(bundle.len() / TRANSACTION_LENGTH * TRANSACTION_ESSENCE_LENGTH);
    for offset in (0..bundle.len()).step_by(TRANSACTION_LENGTH) {
        essence.extend_from_slice(transaction_essence(bundle, offset));
    }

    Ok(essence)
}
