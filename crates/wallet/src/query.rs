//! Ledger Query Service: read-side aggregation over one user's rows.
//!
//! No mutation capability. Reads run concurrently with operations and take
//! no locks that block them; each query sees a consistent snapshot.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use payvault_core::{Money, TransactionId, UserId};
use payvault_ledger::{TransactionDetails, TransactionRecord, TransactionStatus, TransactionType};
use payvault_store::{LedgerStore, Pagination, TransactionFilter};

use crate::error::WalletError;

/// History listing entry: the row plus the type-specific projection the
/// original clients expect (counterparty for transfers, biller for
/// payments), under the legacy external type names.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub amount: Money,
    pub description: String,
    pub status: TransactionStatus,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<TransactionRecord> for TransactionView {
    fn from(record: TransactionRecord) -> Self {
        let mut view = TransactionView {
            id: record.id,
            kind: record.kind().external_name(),
            amount: record.amount,
            description: record.description,
            status: record.status,
            reference: record.reference,
            created_at: record.created_at,
            recipient: None,
            sender: None,
            biller: None,
            account_number: None,
            note: None,
        };
        match record.details {
            TransactionDetails::TopUp { .. } => {}
            TransactionDetails::TransferOut {
                recipient_name,
                note,
                ..
            } => {
                view.recipient = Some(recipient_name);
                view.note = note;
            }
            TransactionDetails::TransferIn {
                sender_name, note, ..
            } => {
                view.sender = Some(sender_name);
                view.note = note;
            }
            TransactionDetails::BillPayment {
                biller_name,
                account_number,
                ..
            } => {
                view.biller = Some(biller_name);
                view.account_number = account_number;
            }
        }
        view
    }
}

/// Paginated history listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListedTransactions {
    pub transactions: Vec<TransactionView>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

/// Count + sum for one slice of the ledger.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TypeBreakdown {
    pub count: u64,
    pub total_amount: Money,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TransferBreakdown {
    pub sent: TypeBreakdown,
    pub received: TypeBreakdown,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TransactionSummary {
    pub topups: TypeBreakdown,
    pub transfers: TransferBreakdown,
    pub bills: TypeBreakdown,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MonthlySpending {
    pub current_month: Money,
    pub previous_month: Money,
}

/// Dashboard aggregation over one user's ledger.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub current_balance: Money,
    pub total_income: Money,
    pub total_expenses: Money,
    pub recent_transactions_count: u64,
    pub pending_transactions_count: u64,
    pub monthly_spending: MonthlySpending,
    pub transaction_summary: TransactionSummary,
}

/// Per-type totals plus the five most recent rows.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionStats {
    pub total_topups: Money,
    pub total_payments: Money,
    pub total_transfers_out: Money,
    pub total_transfers_in: Money,
    pub transaction_count: u64,
    pub recent_transactions: Vec<TransactionView>,
}

#[derive(Clone)]
pub struct LedgerQueryService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerQueryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn balance(&self, user_id: UserId) -> Result<Money, WalletError> {
        Ok(self.store.account(user_id)?.balance)
    }

    pub fn list_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<ListedTransactions, WalletError> {
        let page = self.store.list_transactions(user_id, filter, pagination)?;
        Ok(ListedTransactions {
            transactions: page
                .transactions
                .into_iter()
                .map(TransactionView::from)
                .collect(),
            total: page.total,
            limit: page.pagination.limit,
            offset: page.pagination.offset,
            has_more: page.has_more,
        })
    }

    /// A single row, scoped to its owner: `NotFound` when absent or owned by
    /// another user (indistinguishable to the caller).
    pub fn get_transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<TransactionRecord, WalletError> {
        self.store
            .transaction(user_id, id)?
            .ok_or(WalletError::NotFound)
    }

    pub fn dashboard_stats(&self, user_id: UserId) -> Result<DashboardStats, WalletError> {
        let balance = self.store.account(user_id)?.balance;
        let rows = self.store.transactions_for(user_id)?;

        let now = Utc::now();
        let current_month_start = start_of_month(now);
        let previous_month_start = start_of_month(current_month_start - Duration::days(1));
        let week_ago = now - Duration::days(7);

        let mut stats = DashboardStats {
            current_balance: balance,
            total_income: Money::ZERO,
            total_expenses: Money::ZERO,
            recent_transactions_count: 0,
            pending_transactions_count: 0,
            monthly_spending: MonthlySpending::default(),
            transaction_summary: TransactionSummary::default(),
        };

        for row in &rows {
            let is_expense = matches!(
                row.kind(),
                TransactionType::Payment | TransactionType::TransferOut
            );
            if is_expense {
                stats.total_expenses = stats.total_expenses.checked_add(row.amount)?;
                if row.created_at >= current_month_start {
                    stats.monthly_spending.current_month =
                        stats.monthly_spending.current_month.checked_add(row.amount)?;
                } else if row.created_at >= previous_month_start {
                    stats.monthly_spending.previous_month =
                        stats.monthly_spending.previous_month.checked_add(row.amount)?;
                }
            } else {
                stats.total_income = stats.total_income.checked_add(row.amount)?;
            }

            if row.created_at >= week_ago {
                stats.recent_transactions_count += 1;
            }
            if row.status == TransactionStatus::Pending {
                stats.pending_transactions_count += 1;
            }

            let bucket = match row.kind() {
                TransactionType::TopUp => &mut stats.transaction_summary.topups,
                TransactionType::Payment => &mut stats.transaction_summary.bills,
                TransactionType::TransferOut => &mut stats.transaction_summary.transfers.sent,
                TransactionType::TransferIn => &mut stats.transaction_summary.transfers.received,
            };
            bucket.count += 1;
            bucket.total_amount = bucket.total_amount.checked_add(row.amount)?;
        }

        Ok(stats)
    }

    pub fn transaction_stats(&self, user_id: UserId) -> Result<TransactionStats, WalletError> {
        let rows = self.store.transactions_for(user_id)?;

        let mut stats = TransactionStats {
            total_topups: Money::ZERO,
            total_payments: Money::ZERO,
            total_transfers_out: Money::ZERO,
            total_transfers_in: Money::ZERO,
            transaction_count: rows.len() as u64,
            recent_transactions: Vec::new(),
        };
        for row in &rows {
            let total = match row.kind() {
                TransactionType::TopUp => &mut stats.total_topups,
                TransactionType::Payment => &mut stats.total_payments,
                TransactionType::TransferOut => &mut stats.total_transfers_out,
                TransactionType::TransferIn => &mut stats.total_transfers_in,
            };
            *total = total.checked_add(row.amount)?;
        }
        // Rows come back newest first.
        stats.recent_transactions = rows
            .into_iter()
            .take(5)
            .map(TransactionView::from)
            .collect();
        Ok(stats)
    }
}

fn start_of_month(t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive().with_day(1).unwrap_or_else(|| t.date_naive());
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
