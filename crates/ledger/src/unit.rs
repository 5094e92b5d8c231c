//! The atomic unit of work.
//!
//! A `LedgerUnit` groups the balance changes and transaction rows of one
//! money-movement operation. Stores commit a unit all-or-nothing: every
//! debit is validated against the locked balance and every reference against
//! the uniqueness constraint before anything is written.

use payvault_core::{DomainError, DomainResult, Money, UserId};

use crate::recorder::NewTransaction;

/// One balance adjustment inside a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Credit { user_id: UserId, amount: Money },
    Debit { user_id: UserId, amount: Money },
}

impl BalanceChange {
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Credit { user_id, .. } | Self::Debit { user_id, .. } => *user_id,
        }
    }
}

/// Balance changes + transaction rows that must land together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerUnit {
    changes: Vec<BalanceChange>,
    records: Vec<NewTransaction>,
}

impl LedgerUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(mut self, user_id: UserId, amount: Money) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("credit amount must be positive"));
        }
        self.changes.push(BalanceChange::Credit { user_id, amount });
        Ok(self)
    }

    pub fn debit(mut self, user_id: UserId, amount: Money) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("debit amount must be positive"));
        }
        self.changes.push(BalanceChange::Debit { user_id, amount });
        Ok(self)
    }

    pub fn record(mut self, draft: NewTransaction) -> Self {
        self.records.push(draft);
        self
    }

    pub fn changes(&self) -> &[BalanceChange] {
        &self.changes
    }

    pub fn records(&self) -> &[NewTransaction] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.records.is_empty()
    }

    /// Every user the unit touches, deduplicated and **sorted**.
    ///
    /// Stores acquire per-user locks in exactly this order; the deterministic
    /// order is what keeps concurrent opposite-direction transfers between
    /// the same pair of users from deadlocking.
    pub fn touched_users(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self
            .changes
            .iter()
            .map(BalanceChange::user_id)
            .chain(self.records.iter().map(|r| r.user_id))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Fresh references for every row (conflict retry path).
    pub fn regenerate_references(&mut self) {
        for record in &mut self.records {
            record.regenerate_reference();
        }
    }

    pub fn into_parts(self) -> (Vec<BalanceChange>, Vec<NewTransaction>) {
        (self.changes, self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionDetails;

    fn draft_for(user_id: UserId) -> NewTransaction {
        NewTransaction::new(
            user_id,
            Money::from_cents(100),
            "Account top-up",
            TransactionDetails::TopUp {
                payment_method: "credit_card".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn touched_users_are_sorted_and_deduplicated() {
        let a = UserId::new();
        let b = UserId::new();
        let unit = LedgerUnit::new()
            .debit(b, Money::from_cents(100))
            .unwrap()
            .credit(a, Money::from_cents(100))
            .unwrap()
            .record(draft_for(b));

        let touched = unit.touched_users();
        assert_eq!(touched.len(), 2);
        assert!(touched[0] < touched[1]);
    }

    #[test]
    fn non_positive_changes_are_rejected() {
        let user = UserId::new();
        assert!(LedgerUnit::new().credit(user, Money::ZERO).is_err());
        assert!(LedgerUnit::new()
            .debit(user, Money::from_cents(-1))
            .is_err());
    }

    #[test]
    fn regenerating_references_touches_every_row() {
        let user = UserId::new();
        let mut unit = LedgerUnit::new().record(draft_for(user)).record(draft_for(user));
        let before: Vec<String> = unit.records().iter().map(|r| r.reference.clone()).collect();
        unit.regenerate_references();
        for (old, row) in before.iter().zip(unit.records()) {
            assert_ne!(old, &row.reference);
        }
    }
}
