use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use payvault_wallet::WalletError;

/// Map an operation error onto the HTTP contract.
///
/// | error                            | status |
/// |----------------------------------|--------|
/// | `Validation`                     | 400    |
/// | `InsufficientFunds`              | 422    |
/// | `SelfTransferNotAllowed`         | 422    |
/// | `EmailTaken`                     | 422    |
/// | `RecipientNotFound`, `BillerNotFound`, `NotFound` | 404 |
/// | `OperationFailed`, `Storage`     | 500    |
pub fn wallet_error_to_response(err: WalletError) -> axum::response::Response {
    match err {
        WalletError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, msg),
        WalletError::InsufficientFunds => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Insufficient balance for this transaction",
        ),
        WalletError::SelfTransferNotAllowed => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "You cannot transfer money to yourself",
        ),
        WalletError::EmailTaken => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The email has already been taken",
        ),
        WalletError::RecipientNotFound => {
            json_error(StatusCode::NOT_FOUND, "Recipient not found")
        }
        WalletError::BillerNotFound => json_error(StatusCode::NOT_FOUND, "Biller not found"),
        WalletError::NotFound => json_error(StatusCode::NOT_FOUND, "Not found"),
        // Internal detail stays in the logs, not the response.
        WalletError::OperationFailed | WalletError::Storage(_) => {
            tracing::error!(error = %err, "operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": message.into(),
        })),
    )
        .into_response()
}
