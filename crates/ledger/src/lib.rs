//! `payvault-ledger` — wallet domain model.
//!
//! Accounts (balance owners), immutable transaction records with typed
//! per-kind details, reference generation, billers, and the `LedgerUnit`
//! atomic unit that stores commit all-or-nothing.

pub mod account;
pub mod biller;
pub mod recorder;
pub mod reference;
pub mod transaction;
pub mod unit;

pub use account::Account;
pub use biller::{default_catalog, Biller};
pub use recorder::NewTransaction;
pub use reference::generate_reference;
pub use transaction::{TransactionDetails, TransactionRecord, TransactionStatus, TransactionType};
pub use unit::{BalanceChange, LedgerUnit};
