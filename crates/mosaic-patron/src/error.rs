//! Error types for the pledge data model.

use crate::PatronId;
use thiserror::Error;

/// Errors raised while turning raw pledge records into patrons.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A record arrived with a negative pledge amount.
    #[error("record {id} has a negative pledge amount ({amount})")]
    NegativePledge { id: PatronId, amount: i64 },

    /// The configured cell price is zero; cell units would be undefined.
    #[error("cell price must be a positive number of currency units")]
    ZeroCellPrice,
}
