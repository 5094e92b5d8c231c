//! Postgres-backed ledger store.
//!
//! Persistent implementation of [`LedgerStore`] with atomicity and row
//! locking enforced at the database level.
//!
//! ## Expected Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     name          TEXT NOT NULL,
//!     email         TEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     balance       BIGINT NOT NULL CHECK (balance >= 0),
//!     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE billers (
//!     id          UUID PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     category    TEXT NOT NULL,
//!     description TEXT NOT NULL,
//!     is_active   BOOLEAN NOT NULL DEFAULT TRUE
//! );
//!
//! CREATE TABLE transactions (
//!     id             UUID PRIMARY KEY,
//!     user_id        UUID NOT NULL REFERENCES users (id),
//!     type           TEXT NOT NULL,
//!     amount         BIGINT NOT NULL CHECK (amount > 0),
//!     description    TEXT NOT NULL,
//!     metadata       JSONB NOT NULL,
//!     reference      TEXT NOT NULL UNIQUE,
//!     transfer_group UUID,
//!     status         TEXT NOT NULL,
//!     created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX transactions_user_created
//!     ON transactions (user_id, created_at DESC);
//! ```
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError | Scenario |
//! |------------|-----------------|------------|----------|
//! | Database (unique violation on `reference`) | `23505` | `ReferenceConflict` | Duplicate transaction reference |
//! | Database (unique violation on `email`) | `23505` | `DuplicateEmail` | Registration with a taken email |
//! | Database (check violation on `balance`) | `23514` | `InsufficientFunds` | Belt-and-braces; the locked read catches this first |
//! | Anything else | — | `Storage` | Connection loss, decode failures, etc. |
//!
//! ## Locking
//!
//! `commit()` runs in one database transaction and locks every touched user
//! row with `SELECT ... ORDER BY id FOR UPDATE`. The `ORDER BY id` gives the
//! same deterministic acquisition order the in-memory store uses, so
//! concurrent opposite-direction transfers between the same pair of users
//! cannot deadlock.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction as PgTransaction};
use tracing::instrument;
use uuid::Uuid;

use payvault_core::{BillerId, Money, TransactionId, TransferGroupId, UserId};
use payvault_ledger::{
    Account, BalanceChange, Biller, LedgerUnit, TransactionDetails, TransactionRecord,
    TransactionStatus, TransactionType,
};

use crate::error::StoreError;
use crate::query::{Pagination, TransactionFilter, TransactionPage};
use crate::store::{CommittedUnit, LedgerStore};

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Insert catalog entries that are not present yet (id-based).
    pub async fn seed_billers(&self, catalog: &[Biller]) -> Result<(), StoreError> {
        for biller in catalog {
            sqlx::query(
                r#"
                INSERT INTO billers (id, name, category, description, is_active)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(biller.id.as_uuid())
            .bind(&biller.name)
            .bind(&biller.category)
            .bind(&biller.description)
            .bind(biller.is_active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("seed_billers", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self, password_hash), fields(user_id = %account.id), err)]
    pub async fn create_account_async(
        &self,
        account: Account,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, balance, created_at)
            VALUES ($1, $2, $3, LOWER($4), $5, $6)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.name)
        .bind(&account.email)
        .bind(password_hash)
        .bind(account.balance.cents())
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail(account.email.clone())
            } else {
                map_sqlx_error("create_account", e)
            }
        })?;
        Ok(())
    }

    pub async fn account_async(&self, user_id: UserId) -> Result<Account, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, balance, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("account", e))?;

        match row {
            Some(row) => account_from_row(&row),
            None => Err(StoreError::UnknownUser(user_id)),
        }
    }

    pub async fn credentials_async(
        &self,
        email: &str,
    ) -> Result<Option<(Account, String)>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, balance, created_at, password_hash
            FROM users
            WHERE email = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("credentials", e))?;

        match row {
            Some(row) => {
                let hash: String = row
                    .try_get("password_hash")
                    .map_err(|e| StoreError::storage(format!("decode password_hash: {e}")))?;
                Ok(Some((account_from_row(&row)?, hash)))
            }
            None => Ok(None),
        }
    }

    /// Commit a unit in a single database transaction with row locking.
    #[instrument(
        skip(self, unit),
        fields(changes = unit.changes().len(), records = unit.records().len()),
        err
    )]
    pub async fn commit_async(&self, unit: LedgerUnit) -> Result<CommittedUnit, StoreError> {
        if unit.is_empty() {
            return Ok(CommittedUnit::default());
        }

        let touched = unit.touched_users();
        let touched_uuids: Vec<Uuid> = touched.iter().map(|id| *id.as_uuid()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut balances = lock_balances(&mut tx, &touched, &touched_uuids).await?;

        // Validate and stage every change against the locked balances.
        for change in unit.changes() {
            let user_id = change.user_id();
            let balance = balances
                .get_mut(&user_id)
                .ok_or(StoreError::UnknownUser(user_id))?;
            match change {
                BalanceChange::Credit { amount, .. } => {
                    *balance = balance
                        .checked_add(*amount)
                        .map_err(|e| StoreError::storage(e.to_string()))?;
                }
                BalanceChange::Debit { amount, .. } => {
                    if *balance < *amount {
                        return Err(StoreError::InsufficientFunds { user_id });
                    }
                    *balance = balance
                        .checked_sub(*amount)
                        .map_err(|e| StoreError::storage(e.to_string()))?;
                }
            }
        }

        for (user_id, balance) in &balances {
            sqlx::query("UPDATE users SET balance = $1 WHERE id = $2")
                .bind(balance.cents())
                .bind(user_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_balance", e))?;
        }

        let now = Utc::now();
        let (_, drafts) = unit.into_parts();
        let mut records = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let record = draft.into_record(TransactionId::new(), now);
            sqlx::query(
                r#"
                INSERT INTO transactions (
                    id, user_id, type, amount, description,
                    metadata, reference, transfer_group, status, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(record.id.as_uuid())
            .bind(record.user_id.as_uuid())
            .bind(record.kind().as_str())
            .bind(record.amount.cents())
            .bind(&record.description)
            .bind(record.details.metadata())
            .bind(&record.reference)
            .bind(record.transfer_group.map(|g| *g.as_uuid()))
            .bind(record.status.as_str())
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::ReferenceConflict(record.reference.clone())
                } else {
                    map_sqlx_error("insert_transaction", e)
                }
            })?;
            records.push(record);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(CommittedUnit { balances, records })
    }

    pub async fn list_transactions_async(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        let kind_param: Option<&str> = filter.kind.map(|k| k.as_str());
        let status_param: Option<&str> = filter.status.map(|s| s.as_str());
        let search_param: Option<&str> = filter.search.as_deref();

        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) as total
            FROM transactions
            WHERE user_id = $1
                AND ($2::text IS NULL OR type = $2)
                AND ($3::text IS NULL OR status = $3)
                AND ($4::text IS NULL OR description ILIKE '%' || $4 || '%')
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(kind_param)
        .bind(status_param)
        .bind(search_param)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_transactions", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StoreError::storage(format!("decode count: {e}")))?;

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, type, amount, description,
                   metadata, reference, transfer_group, status, created_at
            FROM transactions
            WHERE user_id = $1
                AND ($2::text IS NULL OR type = $2)
                AND ($3::text IS NULL OR status = $3)
                AND ($4::text IS NULL OR description ILIKE '%' || $4 || '%')
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(kind_param)
        .bind(status_param)
        .bind(search_param)
        .bind(pagination.limit as i64)
        .bind(pagination.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_transactions", e))?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            transactions.push(record_from_row(&row)?);
        }

        let has_more = (pagination.offset as i64 + pagination.limit as i64) < total;
        Ok(TransactionPage {
            transactions,
            total: total as u64,
            pagination,
            has_more,
        })
    }

    pub async fn transactions_for_async(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, type, amount, description,
                   metadata, reference, transfer_group, status, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("transactions_for", e))?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn transaction_async(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, type, amount, description,
                   metadata, reference, transfer_group, status, created_at
            FROM transactions
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("transaction", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    pub async fn billers_async(&self) -> Result<Vec<Biller>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, category, description, is_active FROM billers ORDER BY name",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("billers", e))?;

        rows.iter().map(biller_from_row).collect()
    }

    pub async fn biller_async(&self, id: BillerId) -> Result<Option<Biller>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, category, description, is_active FROM billers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("biller", e))?;

        row.as_ref().map(biller_from_row).transpose()
    }
}

/// Lock every touched user row, in id order, and return their balances.
async fn lock_balances(
    tx: &mut PgTransaction<'_, Postgres>,
    touched: &[UserId],
    touched_uuids: &[Uuid],
) -> Result<HashMap<UserId, Money>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, balance
        FROM users
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(touched_uuids)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_balances", e))?;

    let mut balances = HashMap::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| StoreError::storage(format!("decode user id: {e}")))?;
        let cents: i64 = row
            .try_get("balance")
            .map_err(|e| StoreError::storage(format!("decode balance: {e}")))?;
        balances.insert(UserId::from_uuid(id), Money::from_cents(cents));
    }

    if balances.len() != touched.len() {
        let missing = touched
            .iter()
            .find(|id| !balances.contains_key(id))
            .copied()
            .unwrap_or_else(UserId::new);
        return Err(StoreError::UnknownUser(missing));
    }
    Ok(balances)
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<Account, StoreError> {
    let decode = |e: sqlx::Error| StoreError::storage(format!("decode user row: {e}"));
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let balance: i64 = row.try_get("balance").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    Ok(Account {
        id: UserId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        balance: Money::from_cents(balance),
        created_at,
    })
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<TransactionRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::storage(format!("decode transaction row: {e}"));
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let user_id: Uuid = row.try_get("user_id").map_err(decode)?;
    let kind_raw: String = row.try_get("type").map_err(decode)?;
    let amount: i64 = row.try_get("amount").map_err(decode)?;
    let metadata: serde_json::Value = row.try_get("metadata").map_err(decode)?;
    let transfer_group: Option<Uuid> = row.try_get("transfer_group").map_err(decode)?;
    let status_raw: String = row.try_get("status").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    let kind = TransactionType::from_str(&kind_raw)
        .map_err(|e| StoreError::storage(e.to_string()))?;
    let details = TransactionDetails::from_parts(kind, metadata)
        .map_err(|e| StoreError::storage(e.to_string()))?;
    let status = TransactionStatus::from_str(&status_raw)
        .map_err(|e| StoreError::storage(e.to_string()))?;

    Ok(TransactionRecord {
        id: TransactionId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        amount: Money::from_cents(amount),
        description: row.try_get("description").map_err(decode)?,
        details,
        reference: row.try_get("reference").map_err(decode)?,
        transfer_group: transfer_group.map(TransferGroupId::from_uuid),
        status,
        created_at,
    })
}

fn biller_from_row(row: &sqlx::postgres::PgRow) -> Result<Biller, StoreError> {
    let decode = |e: sqlx::Error| StoreError::storage(format!("decode biller row: {e}"));
    let id: Uuid = row.try_get("id").map_err(decode)?;
    Ok(Biller {
        id: BillerId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        is_active: row.try_get("is_active").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::storage(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::storage(format!("connection pool closed in {operation}"))
        }
        other => StoreError::storage(format!("sqlx error in {operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// The LedgerStore trait is synchronous; Postgres operations require async.
// `block_in_place` + the current runtime handle bridge the two when called
// from async contexts (e.g. axum handlers). Requires a multi-thread runtime.

fn bridge<F>(fut: F) -> Result<F::Output, StoreError>
where
    F: std::future::Future,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::storage(
            "PostgresLedgerStore requires an async runtime (tokio); \
             call from within a tokio runtime context",
        )
    })?;
    Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
}

impl LedgerStore for PostgresLedgerStore {
    fn create_account(&self, account: Account, password_hash: &str) -> Result<(), StoreError> {
        bridge(self.create_account_async(account, password_hash))?
    }

    fn account(&self, user_id: UserId) -> Result<Account, StoreError> {
        bridge(self.account_async(user_id))?
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(bridge(self.credentials_async(email))??.map(|(account, _)| account))
    }

    fn credentials(&self, email: &str) -> Result<Option<(Account, String)>, StoreError> {
        bridge(self.credentials_async(email))?
    }

    fn commit(&self, unit: LedgerUnit) -> Result<CommittedUnit, StoreError> {
        bridge(self.commit_async(unit))?
    }

    fn transactions_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        bridge(self.transactions_for_async(user_id))?
    }

    fn list_transactions(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<TransactionPage, StoreError> {
        bridge(self.list_transactions_async(user_id, filter, pagination))?
    }

    fn transaction(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        bridge(self.transaction_async(user_id, id))?
    }

    fn billers(&self) -> Result<Vec<Biller>, StoreError> {
        bridge(self.billers_async())?
    }

    fn biller(&self, id: BillerId) -> Result<Option<Biller>, StoreError> {
        bridge(self.biller_async(id))?
    }
}
