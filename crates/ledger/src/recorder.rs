//! Transaction drafts.
//!
//! A `NewTransaction` is a row ready to be persisted: everything except the
//! store-assigned id and timestamp. Drafts are validated at construction so
//! a unit never carries a zero/negative amount into a commit.

use chrono::{DateTime, Utc};

use payvault_core::{DomainError, DomainResult, Money, TransactionId, TransferGroupId, UserId};

use crate::reference::generate_reference;
use crate::transaction::{TransactionDetails, TransactionRecord, TransactionStatus};

/// A transaction row awaiting commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub amount: Money,
    pub description: String,
    pub details: TransactionDetails,
    pub reference: String,
    pub transfer_group: Option<TransferGroupId>,
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// Draft a completed transaction with a freshly generated reference.
    pub fn new(
        user_id: UserId,
        amount: Money,
        description: impl Into<String>,
        details: TransactionDetails,
    ) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation(
                "transaction amount must be positive",
            ));
        }
        Ok(Self {
            user_id,
            amount,
            description: description.into(),
            details,
            reference: generate_reference(),
            transfer_group: None,
            status: TransactionStatus::Completed,
        })
    }

    /// Use a caller-supplied reference instead of the generated one.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Link this row to a transfer pair.
    pub fn in_transfer_group(mut self, group: TransferGroupId) -> Self {
        self.transfer_group = Some(group);
        self
    }

    /// Replace the reference with a fresh one (conflict retry path).
    pub fn regenerate_reference(&mut self) {
        self.reference = generate_reference();
    }

    /// Finalize into an immutable record. Called by stores at commit, which
    /// assign the id and timestamp.
    pub fn into_record(self, id: TransactionId, created_at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            id,
            user_id: self.user_id,
            amount: self.amount,
            description: self.description,
            details: self.details,
            reference: self.reference,
            transfer_group: self.transfer_group,
            status: self.status,
            created_at,
        }
    }
}
