//! The `LedgerStore` abstraction.

use std::collections::HashMap;
use std::sync::Arc;

use payvault_core::{BillerId, Money, TransactionId, UserId};
use payvault_ledger::{Account, Biller, LedgerUnit, TransactionRecord};

use crate::error::StoreError;
use crate::query::{Pagination, TransactionFilter, TransactionPage};

/// Result of a committed unit: the rows that now exist and the post-commit
/// balance of every touched user.
#[derive(Debug, Clone, Default)]
pub struct CommittedUnit {
    pub balances: HashMap<UserId, Money>,
    pub records: Vec<TransactionRecord>,
}

impl CommittedUnit {
    pub fn balance_of(&self, user_id: UserId) -> Option<Money> {
        self.balances.get(&user_id).copied()
    }
}

/// Durable storage of accounts, the append-only transaction ledger, and the
/// biller catalog.
///
/// ## Commit Semantics
///
/// `commit()` applies a [`LedgerUnit`] all-or-nothing:
/// - per-user locks are acquired in the unit's sorted `touched_users()` order
///   (deterministic, deadlock-free under concurrent opposite-direction
///   transfers)
/// - every debit is validated against the **locked** balance
///   (`InsufficientFunds` aborts the whole unit)
/// - every reference is validated against the uniqueness constraint
///   (`ReferenceConflict` aborts the whole unit)
/// - ids and timestamps are store-assigned at commit
///
/// A balance never changes without its transaction rows landing, and vice
/// versa — this holds even on crash mid-operation for durable backends.
///
/// ## Read Semantics
///
/// Reads are snapshot-per-query and never take locks that block mutators.
/// Listings are newest first.
pub trait LedgerStore: Send + Sync {
    /// Register a new account. Fails with `DuplicateEmail` if the email is
    /// already taken.
    fn create_account(&self, account: Account, password_hash: &str) -> Result<(), StoreError>;

    /// Load an account by id.
    fn account(&self, user_id: UserId) -> Result<Account, StoreError>;

    /// Look up an account by email.
    fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Look up an account plus its stored password hash (login path).
    fn credentials(&self, email: &str) -> Result<Option<(Account, String)>, StoreError>;

    /// Apply an atomic unit (see trait docs).
    fn commit(&self, unit: LedgerUnit) -> Result<CommittedUnit, StoreError>;

    /// All rows for a user, newest first.
    fn transactions_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Filtered, paginated rows for a user, newest first.
    fn list_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError>;

    /// A single row, scoped to its owner.
    fn transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// The biller catalog (active and inactive entries).
    fn billers(&self) -> Result<Vec<Biller>, StoreError>;

    /// A single biller by id.
    fn biller(&self, id: BillerId) -> Result<Option<Biller>, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn create_account(&self, account: Account, password_hash: &str) -> Result<(), StoreError> {
        (**self).create_account(account, password_hash)
    }

    fn account(&self, user_id: UserId) -> Result<Account, StoreError> {
        (**self).account(user_id)
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        (**self).account_by_email(email)
    }

    fn credentials(&self, email: &str) -> Result<Option<(Account, String)>, StoreError> {
        (**self).credentials(email)
    }

    fn commit(&self, unit: LedgerUnit) -> Result<CommittedUnit, StoreError> {
        (**self).commit(unit)
    }

    fn transactions_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        (**self).transactions_for(user_id)
    }

    fn list_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        (**self).list_transactions(user_id, filter, pagination)
    }

    fn transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        (**self).transaction(user_id, id)
    }

    fn billers(&self) -> Result<Vec<Biller>, StoreError> {
        (**self).billers()
    }

    fn biller(&self, id: BillerId) -> Result<Option<Biller>, StoreError> {
        (**self).biller(id)
    }
}
