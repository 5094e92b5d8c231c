//! `payvault-store` — durable, queryable storage of accounts and the
//! transaction ledger.
//!
//! The store is where atomicity lives: a [`LedgerUnit`] commits
//! all-or-nothing, with per-user locks acquired in deterministic order so
//! the balance check-then-decrement is race-free under concurrent
//! operations.
//!
//! [`LedgerUnit`]: payvault_ledger::LedgerUnit

pub mod error;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod query;
mod store;

pub use error::StoreError;
pub use in_memory::InMemoryLedgerStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresLedgerStore;
pub use query::{Pagination, TransactionFilter, TransactionPage};
pub use store::{CommittedUnit, LedgerStore};
