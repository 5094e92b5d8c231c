use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::json;

use payvault_wallet::WalletError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/topup", post(top_up))
        .route("/transfer", post(transfer))
        .route("/bills/pay", post(pay_bill))
        // Aliases kept for older clients.
        .route("/wallet/topup", post(top_up))
        .route("/wallet/transfer", post(transfer))
        .route("/wallet/balance", get(balance))
}

pub async fn top_up(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::TopUpRequest>,
) -> axum::response::Response {
    match services
        .wallet
        .top_up(actor.user_id(), body.amount, body.payment_method)
    {
        Ok(receipt) => dto::ok("Top-up successful", dto::receipt_to_json(&receipt)),
        Err(e) => errors::wallet_error_to_response(e),
    }
}

pub async fn transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::TransferRequest>,
) -> axum::response::Response {
    let recipient_id = match (body.recipient_id, body.recipient_email.as_deref()) {
        (Some(id), _) => id,
        (None, Some(email)) => match services.store.account_by_email(email) {
            Ok(Some(account)) => account.id,
            Ok(None) => return errors::wallet_error_to_response(WalletError::RecipientNotFound),
            Err(e) => return errors::wallet_error_to_response(e.into()),
        },
        (None, None) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "recipient_id or recipient_email is required",
            );
        }
    };

    match services
        .wallet
        .transfer(actor.user_id(), recipient_id, body.amount, body.note)
    {
        Ok(receipt) => dto::ok("Transfer successful", dto::receipt_to_json(&receipt)),
        Err(e) => errors::wallet_error_to_response(e),
    }
}

pub async fn pay_bill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::PayBillRequest>,
) -> axum::response::Response {
    match services.wallet.pay_bill(
        actor.user_id(),
        body.biller_id,
        body.amount,
        body.account_number,
    ) {
        Ok(receipt) => dto::ok("Bill payment successful", dto::receipt_to_json(&receipt)),
        Err(e) => errors::wallet_error_to_response(e),
    }
}

pub async fn balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.query.balance(actor.user_id()) {
        Ok(balance) => dto::ok("Balance retrieved", json!({ "balance": balance })),
        Err(e) => errors::wallet_error_to_response(e),
    }
}
