//! Request DTOs and JSON mapping helpers.
//!
//! Every response uses the `{ "success": bool, "message": str, "data": ... }`
//! envelope the existing clients expect.

use std::str::FromStr;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use payvault_core::{BillerId, Money, UserId};
use payvault_ledger::{Account, TransactionStatus, TransactionType};
use payvault_store::{Pagination, TransactionFilter};
use payvault_wallet::Receipt;

use crate::app::errors;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: Money,
    pub payment_method: Option<String>,
}

/// Transfer body. Recipients are addressed by id (the primary contract;
/// clients resolve email to id via `/users/search`) or directly by email.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub recipient_id: Option<UserId>,
    pub recipient_email: Option<String>,
    pub amount: Money,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayBillRequest {
    pub biller_id: BillerId,
    pub amount: Money,
    pub account_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub email: String,
}

/// Listing query string: `?type=&status=&search=&limit=&offset=`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }

    /// Parse filter params, accepting both the presentation type names
    /// (`bill_payment`, `transfer_sent`, ...) and the stored ones.
    pub fn filter(&self) -> Result<TransactionFilter, axum::response::Response> {
        let kind = match self.kind.as_deref() {
            None => None,
            Some(raw) => Some(parse_kind(raw).ok_or_else(|| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    format!("unknown transaction type '{raw}'"),
                )
            })?),
        };
        let status = match self.status.as_deref() {
            None => None,
            Some(raw) => Some(TransactionStatus::from_str(raw).map_err(|e| {
                errors::json_error(StatusCode::BAD_REQUEST, e.to_string())
            })?),
        };
        Ok(TransactionFilter {
            kind,
            status,
            search: self.search.clone(),
        })
    }
}

fn parse_kind(raw: &str) -> Option<TransactionType> {
    match raw {
        "bill_payment" => Some(TransactionType::Payment),
        "transfer_sent" => Some(TransactionType::TransferOut),
        "transfer_received" => Some(TransactionType::TransferIn),
        other => TransactionType::from_str(other).ok(),
    }
}

pub fn user_to_json(account: &Account) -> serde_json::Value {
    json!({
        "id": account.id,
        "name": account.name,
        "email": account.email,
        "balance": account.balance,
    })
}

pub fn receipt_to_json(receipt: &Receipt) -> serde_json::Value {
    json!({
        "transaction": payvault_wallet::TransactionView::from(receipt.transaction.clone()),
        "new_balance": receipt.new_balance,
    })
}

pub fn success(
    status: StatusCode,
    message: impl Into<String>,
    data: impl Serialize,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "success": true,
            "message": message.into(),
            "data": data,
        })),
    )
        .into_response()
}

pub fn ok(message: impl Into<String>, data: impl Serialize) -> axum::response::Response {
    success(StatusCode::OK, message, data)
}
