use serde::Serialize;
use thiserror::Error;

use crate::money::{Currency, Money};

#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum LedgerError {
    /// Malformed input; surfaced to the caller, never retried.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Custom split shares do not total the transaction amount.
    #[error("Split amounts must total {expected}, got {actual}")]
    SplitAmountMismatch { expected: Money, actual: Money },

    /// Wallet balance cannot cover the requested debit plus fees.
    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: Money, available: Money },

    /// Amount falls outside the provider's accepted range.
    #[error("Amount out of range: must be between {min} and {max}")]
    AmountOutOfRange { min: Money, max: Money },

    /// Arithmetic across two different currency tags.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// Unknown identifier, or an identifier the caller does not own.
    /// Ownership failures are indistinguishable from absence.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Per-aggregate lock wait budget exceeded; the caller may retry.
    #[error("Aggregate busy, retry later")]
    Busy,

    /// Payment provider reported a failure; the payment is finalized as
    /// failed and the wallet left untouched.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
