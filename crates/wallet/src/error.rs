//! Operation-level error taxonomy.
//!
//! Domain errors surface to callers as-is and are never retried; a
//! `ReferenceConflict` is retried once inside the operation before becoming
//! `OperationFailed`; storage faults roll the unit back fully and are safe
//! for the caller to retry.

use thiserror::Error;

use payvault_core::DomainError;
use payvault_store::StoreError;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Malformed or out-of-range input. Surfaced verbatim, no retry.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient balance for this transaction")]
    InsufficientFunds,

    #[error("cannot transfer to yourself")]
    SelfTransferNotAllowed,

    #[error("recipient not found")]
    RecipientNotFound,

    #[error("biller not found")]
    BillerNotFound,

    #[error("not found")]
    NotFound,

    #[error("email already registered")]
    EmailTaken,

    /// Internal failure after exhausting retries; the caller may retry the
    /// whole operation, no partial state persists.
    #[error("operation failed")]
    OperationFailed,

    /// Infrastructure fault; the atomic unit was fully rolled back.
    #[error("storage failure")]
    Storage(#[source] StoreError),
}

impl WalletError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for WalletError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientFunds => Self::InsufficientFunds,
            DomainError::NotFound => Self::NotFound,
            DomainError::AmountOverflow(_) => Self::OperationFailed,
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
        }
    }
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientFunds { .. } => Self::InsufficientFunds,
            StoreError::UnknownUser(_) => Self::NotFound,
            StoreError::DuplicateEmail(_) => Self::EmailTaken,
            // Operations retry conflicts themselves; one that escapes here
            // exhausted its retry.
            StoreError::ReferenceConflict(_) => Self::OperationFailed,
            other @ StoreError::Storage(_) => Self::Storage(other),
        }
    }
}
