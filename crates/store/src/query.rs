//! Read-side query types for the transaction ledger.
//!
//! All listings are scoped to one user and paginated by default. Reads take
//! no locks that block mutators; consistency is snapshot-per-query.

use serde::{Deserialize, Serialize};

use payvault_ledger::{TransactionRecord, TransactionStatus, TransactionType};

/// Pagination parameters for ledger listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of rows to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000),
            offset: offset.unwrap_or(0),
        }
    }
}

/// Filter criteria for transaction listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Filter by ledger entry kind (optional).
    pub kind: Option<TransactionType>,
    /// Filter by settlement status (optional).
    pub status: Option<TransactionStatus>,
    /// Case-insensitive substring match on the description (optional).
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(kind) = self.kind {
            if record.kind() != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !record
                .description
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Paginated listing result, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRecord>,
    /// Total rows matching the filter (across all pages).
    pub total: u64,
    pub pagination: Pagination,
    /// `(offset + limit) < total`.
    pub has_more: bool,
}

impl TransactionPage {
    pub fn from_filtered(filtered: Vec<TransactionRecord>, pagination: Pagination) -> Self {
        let total = filtered.len() as u64;
        let transactions: Vec<TransactionRecord> = filtered
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        let has_more = (pagination.offset as u64 + pagination.limit as u64) < total;
        Self {
            transactions,
            total,
            pagination,
            has_more,
        }
    }
}
