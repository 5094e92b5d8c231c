//! Money-movement operations.
//!
//! Each operation validates its preconditions, builds one [`LedgerUnit`] and
//! commits it through the store. Balance checks are re-validated under the
//! store's locks, so the fast-fail checks here are a courtesy, not the
//! correctness boundary. On `ReferenceConflict` the unit is retried once
//! with fresh references before surfacing `OperationFailed`.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use payvault_core::{BillerId, Money, TransferGroupId, UserId};
use payvault_ledger::{
    Account, LedgerUnit, NewTransaction, TransactionDetails, TransactionRecord, TransactionType,
};
use payvault_store::{CommittedUnit, LedgerStore, StoreError};

use crate::config::WalletConfig;
use crate::error::WalletError;

/// Caller-facing result of a successful operation: the caller-side row and
/// the caller's post-commit balance.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction: TransactionRecord,
    pub new_balance: Money,
}

#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn LedgerStore>,
    config: WalletConfig,
}

impl WalletService {
    pub fn new(store: Arc<dyn LedgerStore>, config: WalletConfig) -> Self {
        Self { store, config }
    }

    /// Create a user with a zero balance. Identity mechanics (tokens,
    /// password hashing) stay with the caller.
    #[instrument(skip(self, password_hash), err)]
    pub fn register(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, WalletError> {
        let account = Account::open(name, email)?;
        self.store.create_account(account.clone(), password_hash)?;
        info!(user_id = %account.id, "user registered");
        Ok(account)
    }

    /// Credit the user's balance and record a `topup` row, atomically.
    #[instrument(skip(self), fields(user_id = %user_id, amount = %amount), err)]
    pub fn top_up(
        &self,
        user_id: UserId,
        amount: Money,
        payment_method: Option<String>,
    ) -> Result<Receipt, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::validation("amount must be positive"));
        }
        if amount > self.config.topup_ceiling {
            return Err(WalletError::validation(format!(
                "amount must not exceed {}",
                self.config.topup_ceiling
            )));
        }
        // Reject unknown users before building the unit.
        self.store.account(user_id)?;

        let details = TransactionDetails::TopUp {
            payment_method: payment_method.unwrap_or_else(|| "credit_card".to_string()),
        };
        let unit = LedgerUnit::new()
            .credit(user_id, amount)?
            .record(NewTransaction::new(user_id, amount, "Account top-up", details)?);

        let committed = self.commit_with_retry(unit)?;
        let receipt = receipt_for(committed, user_id, TransactionType::TopUp)?;
        info!(user_id = %user_id, amount = %amount, "user topped up account");
        Ok(receipt)
    }

    /// Move funds between two users: debit + credit + two linked rows in one
    /// atomic unit. The result describes only the sender-side row.
    #[instrument(skip(self, note), fields(sender = %sender_id, recipient = %recipient_id, amount = %amount), err)]
    pub fn transfer(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        amount: Money,
        note: Option<String>,
    ) -> Result<Receipt, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::validation("amount must be positive"));
        }
        if sender_id == recipient_id {
            return Err(WalletError::SelfTransferNotAllowed);
        }

        let sender = self.store.account(sender_id)?;
        let recipient = match self.store.account(recipient_id) {
            Ok(account) => account,
            Err(StoreError::UnknownUser(_)) => return Err(WalletError::RecipientNotFound),
            Err(other) => return Err(other.into()),
        };
        // Fast fail; the authoritative check happens under the store's lock.
        if sender.balance < amount {
            return Err(WalletError::InsufficientFunds);
        }

        let group = TransferGroupId::new();
        let outgoing = NewTransaction::new(
            sender_id,
            amount,
            format!("Transfer to {}", recipient.name),
            TransactionDetails::TransferOut {
                recipient_id,
                recipient_name: recipient.name.clone(),
                recipient_email: recipient.email.clone(),
                note: note.clone(),
            },
        )?
        .in_transfer_group(group);
        let incoming = NewTransaction::new(
            recipient_id,
            amount,
            format!("Transfer from {}", sender.name),
            TransactionDetails::TransferIn {
                sender_id,
                sender_name: sender.name.clone(),
                sender_email: sender.email.clone(),
                note,
            },
        )?
        .in_transfer_group(group);

        let unit = LedgerUnit::new()
            .debit(sender_id, amount)?
            .credit(recipient_id, amount)?
            .record(outgoing)
            .record(incoming);

        let committed = self.commit_with_retry(unit)?;
        let receipt = receipt_for(committed, sender_id, TransactionType::TransferOut)?;
        info!(user_id = %sender_id, recipient = %recipient.email, amount = %amount, "user transferred funds");
        info!(user_id = %recipient_id, sender = %sender.email, amount = %amount, "user received funds");
        Ok(receipt)
    }

    /// Debit the user and record a `payment` row tagged with biller
    /// metadata, atomically.
    #[instrument(skip(self, account_number), fields(user_id = %user_id, biller_id = %biller_id, amount = %amount), err)]
    pub fn pay_bill(
        &self,
        user_id: UserId,
        biller_id: BillerId,
        amount: Money,
        account_number: Option<String>,
    ) -> Result<Receipt, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::validation("amount must be positive"));
        }

        let biller = self
            .store
            .biller(biller_id)?
            .filter(|b| b.is_active)
            .ok_or(WalletError::BillerNotFound)?;
        let payer = self.store.account(user_id)?;
        if payer.balance < amount {
            return Err(WalletError::InsufficientFunds);
        }

        let details = TransactionDetails::BillPayment {
            biller_id,
            biller_name: biller.name.clone(),
            biller_category: biller.category.clone(),
            account_number,
        };
        let unit = LedgerUnit::new().debit(user_id, amount)?.record(
            NewTransaction::new(
                user_id,
                amount,
                format!("Bill payment to {}", biller.name),
                details,
            )?,
        );

        let committed = self.commit_with_retry(unit)?;
        let receipt = receipt_for(committed, user_id, TransactionType::Payment)?;
        info!(user_id = %user_id, biller = %biller.name, amount = %amount, "user paid bill");
        Ok(receipt)
    }

    fn commit_with_retry(&self, unit: LedgerUnit) -> Result<CommittedUnit, WalletError> {
        let mut unit = unit;
        match self.store.commit(unit.clone()) {
            Ok(committed) => Ok(committed),
            Err(StoreError::ReferenceConflict(reference)) => {
                warn!(%reference, "reference conflict, retrying with fresh references");
                unit.regenerate_references();
                self.store.commit(unit).map_err(WalletError::from)
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn receipt_for(
    committed: CommittedUnit,
    user_id: UserId,
    kind: TransactionType,
) -> Result<Receipt, WalletError> {
    let new_balance = committed
        .balance_of(user_id)
        .ok_or(WalletError::OperationFailed)?;
    let transaction = committed
        .records
        .into_iter()
        .find(|r| r.user_id == user_id && r.kind() == kind)
        .ok_or(WalletError::OperationFailed)?;
    Ok(Receipt {
        transaction,
        new_balance,
    })
}
