//! Store operation errors.
//!
//! These are the failures a commit or read can surface. Domain-deterministic
//! outcomes (`InsufficientFunds`, `ReferenceConflict`, `UnknownUser`,
//! `DuplicateEmail`) are distinguishable so callers can map them to their own
//! taxonomy; everything infrastructural collapses into `Storage`.

use thiserror::Error;

use payvault_core::UserId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A debit in the unit was not covered by the locked balance.
    #[error("insufficient funds for user {user_id}")]
    InsufficientFunds { user_id: UserId },

    /// A transaction reference collided with an existing row (or another row
    /// in the same unit). The whole unit was rolled back.
    #[error("transaction reference already exists: {0}")]
    ReferenceConflict(String),

    /// The unit referenced a user the store does not know.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// Account creation with an email that is already registered.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Infrastructure failure (connection loss, poisoned lock, row decode).
    /// The unit is fully rolled back; the caller may retry.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
