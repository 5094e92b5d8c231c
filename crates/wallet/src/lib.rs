//! `payvault-wallet` — money-movement operations and the read-side query
//! service.
//!
//! Operations take the acting user explicitly, validate preconditions, build
//! a [`LedgerUnit`] and commit it through the store as one atomic unit. The
//! query service aggregates a user's ledger for dashboards and history.
//!
//! [`LedgerUnit`]: payvault_ledger::LedgerUnit

pub mod config;
pub mod error;
pub mod query;
pub mod service;

pub use config::WalletConfig;
pub use error::WalletError;
pub use query::{
    DashboardStats, LedgerQueryService, ListedTransactions, TransactionStats, TransactionView,
};
pub use service::{Receipt, WalletService};
