//! Wallet account: identity plus the mutable balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use payvault_core::{DomainError, DomainResult, Money, UserId};

/// A wallet user's account.
///
/// The balance is only ever mutated through `credit`/`debit`, and those are
/// only applied by a store while the account's lock is held — the
/// check-then-decrement in `debit` is race-free inside an atomic unit.
///
/// Invariant: `balance >= 0` after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Open a new account with a zero balance.
    pub fn open(name: impl Into<String>, email: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if email.trim().is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email must be a valid address"));
        }
        Ok(Self {
            id: UserId::new(),
            name,
            email,
            balance: Money::ZERO,
            created_at: Utc::now(),
        })
    }

    /// Add `amount` to the balance. `amount` must be strictly positive.
    pub fn credit(&mut self, amount: Money) -> DomainResult<()> {
        if !amount.is_positive() {
            return Err(DomainError::validation("credit amount must be positive"));
        }
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }

    /// Subtract `amount` from the balance. `amount` must be strictly positive
    /// and covered by the current balance.
    pub fn debit(&mut self, amount: Money) -> DomainResult<()> {
        if !amount.is_positive() {
            return Err(DomainError::validation("debit amount must be positive"));
        }
        if self.balance < amount {
            return Err(DomainError::InsufficientFunds);
        }
        self.balance = self.balance.checked_sub(amount)?;
        Ok(())
    }
}
