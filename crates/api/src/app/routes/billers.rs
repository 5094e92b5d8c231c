use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_billers))
        // Alias kept for older clients; same handler as /bills/pay.
        .route("/pay", post(super::wallet::pay_bill))
}

pub async fn list_billers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.billers() {
        Ok(billers) => {
            let active: Vec<_> = billers.into_iter().filter(|b| b.is_active).collect();
            dto::ok("Billers retrieved", active)
        }
        Err(e) => errors::wallet_error_to_response(e.into()),
    }
}
