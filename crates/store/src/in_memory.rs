//! In-memory ledger store.
//!
//! Intended for tests/dev, but implements the full commit contract: per-user
//! locks taken in sorted order, all validation before any mutation, and an
//! append-only transaction log.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;

use payvault_core::{BillerId, DomainError, TransactionId, UserId};
use payvault_ledger::{
    default_catalog, Account, BalanceChange, Biller, LedgerUnit, TransactionRecord,
};

use crate::error::StoreError;
use crate::query::{Pagination, TransactionFilter, TransactionPage};
use crate::store::{CommittedUnit, LedgerStore};

#[derive(Debug)]
struct AccountState {
    account: Account,
    password_hash: String,
}

/// One lockable account row. Commits hold this mutex for every touched user
/// while they validate and apply, which is what makes check-then-decrement
/// race-free.
#[derive(Debug)]
struct AccountSlot {
    state: Mutex<AccountState>,
}

#[derive(Debug)]
pub struct InMemoryLedgerStore {
    accounts: RwLock<HashMap<UserId, Arc<AccountSlot>>>,
    emails: RwLock<HashMap<String, UserId>>,
    // Append-only; rows are pushed in chronological order.
    transactions: RwLock<Vec<TransactionRecord>>,
    // Uniqueness constraint on references.
    references: RwLock<HashSet<String>>,
    billers: Vec<Biller>,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::with_billers(default_catalog())
    }
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_billers(billers: Vec<Biller>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            emails: RwLock::new(HashMap::new()),
            transactions: RwLock::new(Vec::new()),
            references: RwLock::new(HashSet::new()),
            billers,
        }
    }

    fn slot(&self, user_id: UserId) -> Result<Arc<AccountSlot>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::storage("accounts lock poisoned"))?;
        accounts
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::UnknownUser(user_id))
    }

    /// User's rows, newest first (the log itself is chronological).
    fn rows_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        let log = self
            .transactions
            .read()
            .map_err(|_| StoreError::storage("transactions lock poisoned"))?;
        Ok(log
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn create_account(&self, account: Account, password_hash: &str) -> Result<(), StoreError> {
        let mut emails = self
            .emails
            .write()
            .map_err(|_| StoreError::storage("emails lock poisoned"))?;
        let key = account.email.to_lowercase();
        if emails.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(account.email));
        }

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::storage("accounts lock poisoned"))?;
        emails.insert(key, account.id);
        accounts.insert(
            account.id,
            Arc::new(AccountSlot {
                state: Mutex::new(AccountState {
                    account,
                    password_hash: password_hash.to_string(),
                }),
            }),
        );
        Ok(())
    }

    fn account(&self, user_id: UserId) -> Result<Account, StoreError> {
        let slot = self.slot(user_id)?;
        let state = slot
            .state
            .lock()
            .map_err(|_| StoreError::storage("account lock poisoned"))?;
        Ok(state.account.clone())
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.credentials(email)?.map(|(account, _)| account))
    }

    fn credentials(&self, email: &str) -> Result<Option<(Account, String)>, StoreError> {
        let user_id = {
            let emails = self
                .emails
                .read()
                .map_err(|_| StoreError::storage("emails lock poisoned"))?;
            match emails.get(&email.to_lowercase()) {
                Some(id) => *id,
                None => return Ok(None),
            }
        };
        let slot = self.slot(user_id)?;
        let state = slot
            .state
            .lock()
            .map_err(|_| StoreError::storage("account lock poisoned"))?;
        Ok(Some((state.account.clone(), state.password_hash.clone())))
    }

    fn commit(&self, unit: LedgerUnit) -> Result<CommittedUnit, StoreError> {
        if unit.is_empty() {
            return Ok(CommittedUnit::default());
        }

        // Sorted + deduplicated: the deterministic lock acquisition order.
        let touched = unit.touched_users();
        let slots: Vec<Arc<AccountSlot>> = touched
            .iter()
            .map(|id| self.slot(*id))
            .collect::<Result<_, _>>()?;

        let mut guards: Vec<MutexGuard<'_, AccountState>> = Vec::with_capacity(slots.len());
        for slot in &slots {
            guards.push(
                slot.state
                    .lock()
                    .map_err(|_| StoreError::storage("account lock poisoned"))?,
            );
        }
        let index: HashMap<UserId, usize> =
            touched.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        // Stage all balance changes on copies; nothing is visible yet.
        let mut staged: Vec<Account> = guards.iter().map(|g| g.account.clone()).collect();
        for change in unit.changes() {
            let user_id = change.user_id();
            let slot_idx = index[&user_id];
            let outcome = match change {
                BalanceChange::Credit { amount, .. } => staged[slot_idx].credit(*amount),
                BalanceChange::Debit { amount, .. } => staged[slot_idx].debit(*amount),
            };
            outcome.map_err(|e| match e {
                DomainError::InsufficientFunds => StoreError::InsufficientFunds { user_id },
                other => StoreError::storage(other.to_string()),
            })?;
        }

        // Uniqueness constraint: against persisted rows and within the unit.
        let mut references = self
            .references
            .write()
            .map_err(|_| StoreError::storage("references lock poisoned"))?;
        let mut in_unit: HashSet<&str> = HashSet::new();
        for draft in unit.records() {
            if references.contains(&draft.reference) || !in_unit.insert(&draft.reference) {
                return Err(StoreError::ReferenceConflict(draft.reference.clone()));
            }
        }

        // Point of no return: everything validated, apply in one sweep.
        let now = Utc::now();
        let (_, drafts) = unit.into_parts();
        let mut records = Vec::with_capacity(drafts.len());
        for draft in drafts {
            references.insert(draft.reference.clone());
            records.push(draft.into_record(TransactionId::new(), now));
        }
        {
            let mut log = self
                .transactions
                .write()
                .map_err(|_| StoreError::storage("transactions lock poisoned"))?;
            log.extend(records.iter().cloned());
        }
        let mut balances = HashMap::with_capacity(guards.len());
        for (guard, account) in guards.iter_mut().zip(staged) {
            balances.insert(account.id, account.balance);
            guard.account = account;
        }

        Ok(CommittedUnit { balances, records })
    }

    fn transactions_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        self.rows_for(user_id)
    }

    fn list_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        let filtered: Vec<TransactionRecord> = self
            .rows_for(user_id)?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        Ok(TransactionPage::from_filtered(filtered, pagination))
    }

    fn transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let log = self
            .transactions
            .read()
            .map_err(|_| StoreError::storage("transactions lock poisoned"))?;
        Ok(log
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    fn billers(&self) -> Result<Vec<Biller>, StoreError> {
        Ok(self.billers.clone())
    }

    fn biller(&self, id: BillerId) -> Result<Option<Biller>, StoreError> {
        Ok(self.billers.iter().find(|b| b.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payvault_core::Money;
    use payvault_ledger::{NewTransaction, TransactionDetails, TransactionType};
    use proptest::prelude::*;

    fn open_account(store: &InMemoryLedgerStore, name: &str, cents: i64) -> Account {
        let mut account = Account::open(name, format!("{name}@example.com")).unwrap();
        account.balance = Money::from_cents(cents);
        store.create_account(account.clone(), "hash").unwrap();
        account
    }

    fn topup_draft(user_id: UserId, cents: i64) -> NewTransaction {
        NewTransaction::new(
            user_id,
            Money::from_cents(cents),
            "Account top-up",
            TransactionDetails::TopUp {
                payment_method: "credit_card".to_string(),
            },
        )
        .unwrap()
    }

    fn payment_draft(store: &InMemoryLedgerStore, user_id: UserId, cents: i64) -> NewTransaction {
        let biller = store.billers().unwrap().into_iter().next().unwrap();
        NewTransaction::new(
            user_id,
            Money::from_cents(cents),
            format!("Bill payment to {}", biller.name),
            TransactionDetails::BillPayment {
                biller_id: biller.id,
                biller_name: biller.name,
                biller_category: biller.category,
                account_number: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn commit_moves_balance_and_appends_row_together() {
        let store = InMemoryLedgerStore::new();
        let user = open_account(&store, "ada", 0);

        let unit = LedgerUnit::new()
            .credit(user.id, Money::from_cents(5000))
            .unwrap()
            .record(topup_draft(user.id, 5000));
        let committed = store.commit(unit).unwrap();

        assert_eq!(committed.balance_of(user.id), Some(Money::from_cents(5000)));
        assert_eq!(committed.records.len(), 1);
        assert_eq!(store.account(user.id).unwrap().balance, Money::from_cents(5000));
        assert_eq!(store.transactions_for(user.id).unwrap().len(), 1);
    }

    #[test]
    fn failed_debit_leaves_no_trace() {
        let store = InMemoryLedgerStore::new();
        let user = open_account(&store, "ada", 100);

        let unit = LedgerUnit::new()
            .debit(user.id, Money::from_cents(200))
            .unwrap()
            .record(payment_draft(&store, user.id, 200));
        let err = store.commit(unit).unwrap_err();

        assert!(matches!(err, StoreError::InsufficientFunds { .. }));
        assert_eq!(store.account(user.id).unwrap().balance, Money::from_cents(100));
        assert!(store.transactions_for(user.id).unwrap().is_empty());
    }

    #[test]
    fn transfer_unit_is_atomic_across_both_parties() {
        let store = InMemoryLedgerStore::new();
        let a = open_account(&store, "ada", 10_000);
        let b = open_account(&store, "bob", 0);

        let group = payvault_core::TransferGroupId::new();
        let out = NewTransaction::new(
            a.id,
            Money::from_cents(3000),
            "Transfer to bob",
            TransactionDetails::TransferOut {
                recipient_id: b.id,
                recipient_name: "bob".to_string(),
                recipient_email: "bob@example.com".to_string(),
                note: None,
            },
        )
        .unwrap()
        .in_transfer_group(group);
        let incoming = NewTransaction::new(
            b.id,
            Money::from_cents(3000),
            "Transfer from ada",
            TransactionDetails::TransferIn {
                sender_id: a.id,
                sender_name: "ada".to_string(),
                sender_email: "ada@example.com".to_string(),
                note: None,
            },
        )
        .unwrap()
        .in_transfer_group(group);

        let unit = LedgerUnit::new()
            .debit(a.id, Money::from_cents(3000))
            .unwrap()
            .credit(b.id, Money::from_cents(3000))
            .unwrap()
            .record(out)
            .record(incoming);
        let committed = store.commit(unit).unwrap();

        assert_eq!(committed.balance_of(a.id), Some(Money::from_cents(7000)));
        assert_eq!(committed.balance_of(b.id), Some(Money::from_cents(3000)));
        assert_eq!(store.transactions_for(a.id).unwrap().len(), 1);
        assert_eq!(store.transactions_for(b.id).unwrap().len(), 1);
        assert_eq!(
            store.transactions_for(a.id).unwrap()[0].transfer_group,
            Some(group)
        );
    }

    #[test]
    fn duplicate_reference_aborts_the_whole_unit() {
        let store = InMemoryLedgerStore::new();
        let user = open_account(&store, "ada", 10_000);

        let first = LedgerUnit::new()
            .credit(user.id, Money::from_cents(100))
            .unwrap()
            .record(topup_draft(user.id, 100).with_reference("TXNSAMEREFERENCE00"));
        store.commit(first).unwrap();

        let second = LedgerUnit::new()
            .credit(user.id, Money::from_cents(100))
            .unwrap()
            .record(topup_draft(user.id, 100).with_reference("TXNSAMEREFERENCE00"));
        let err = store.commit(second).unwrap_err();

        assert!(matches!(err, StoreError::ReferenceConflict(_)));
        // Balance unchanged by the failed unit, exactly one row exists.
        assert_eq!(
            store.account(user.id).unwrap().balance,
            Money::from_cents(10_100)
        );
        assert_eq!(store.transactions_for(user.id).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = InMemoryLedgerStore::new();
        open_account(&store, "ada", 0);
        let dup = Account::open("Ada Again", "ADA@example.com").unwrap();
        assert!(matches!(
            store.create_account(dup, "hash"),
            Err(StoreError::DuplicateEmail(_))
        ));
    }

    #[test]
    fn concurrent_debits_never_lose_an_update() {
        // Balance 100.00, 10 racing debits of 30.00: exactly 3 may succeed.
        let store = Arc::new(InMemoryLedgerStore::new());
        let user = open_account(&store, "ada", 10_000);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let user_id = user.id;
            handles.push(std::thread::spawn(move || {
                let unit = LedgerUnit::new()
                    .debit(user_id, Money::from_cents(3000))
                    .unwrap()
                    .record(payment_draft(&store, user_id, 3000));
                store.commit(unit).is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 3);
        assert_eq!(store.account(user.id).unwrap().balance, Money::from_cents(1000));
        assert_eq!(store.transactions_for(user.id).unwrap().len(), 3);
    }

    #[test]
    fn opposite_direction_transfers_do_not_deadlock() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let a = open_account(&store, "ada", 100_000);
        let b = open_account(&store, "bob", 100_000);

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            handles.push(std::thread::spawn(move || {
                let unit = LedgerUnit::new()
                    .debit(from, Money::from_cents(100))
                    .unwrap()
                    .credit(to, Money::from_cents(100))
                    .unwrap();
                store.commit(unit).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // Equal traffic both ways: balances end where they started.
        assert_eq!(store.account(a.id).unwrap().balance, Money::from_cents(100_000));
        assert_eq!(store.account(b.id).unwrap().balance, Money::from_cents(100_000));
    }

    proptest! {
        /// Balance is always derivable from the ledger: after any sequence of
        /// committed units, balance == initial + Σ credits − Σ debits over the
        /// user's rows, and never negative.
        #[test]
        fn balance_is_derivable_from_the_ledger(
            initial in 0i64..50_000,
            ops in prop::collection::vec((any::<bool>(), 1i64..10_000), 0..40),
        ) {
            let store = InMemoryLedgerStore::new();
            let user = open_account(&store, "ada", initial);

            for (is_credit, cents) in ops {
                let amount = Money::from_cents(cents);
                let unit = if is_credit {
                    LedgerUnit::new()
                        .credit(user.id, amount).unwrap()
                        .record(topup_draft(user.id, cents))
                } else {
                    LedgerUnit::new()
                        .debit(user.id, amount).unwrap()
                        .record(payment_draft(&store, user.id, cents))
                };
                // Debits may legitimately fail; failure must leave no trace,
                // which the derivability check below verifies.
                let _ = store.commit(unit);
            }

            let balance = store.account(user.id).unwrap().balance;
            prop_assert!(!balance.is_negative());

            let mut derived = Money::from_cents(initial);
            for row in store.transactions_for(user.id).unwrap() {
                derived = match row.kind() {
                    TransactionType::TopUp | TransactionType::TransferIn => {
                        derived.checked_add(row.amount).unwrap()
                    }
                    TransactionType::Payment | TransactionType::TransferOut => {
                        derived.checked_sub(row.amount).unwrap()
                    }
                };
            }
            prop_assert_eq!(balance, derived);
        }
    }
}
