use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::get,
};

use payvault_core::TransactionId;
use payvault_wallet::TransactionView;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_transactions))
        .route("/stats", get(transaction_stats))
        .route("/:id", get(get_transaction))
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let filter = match query.filter() {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };

    match services
        .query
        .list_transactions(actor.user_id(), &filter, query.pagination())
    {
        Ok(listed) => dto::ok("Transactions retrieved", listed),
        Err(e) => errors::wallet_error_to_response(e),
    }
}

pub async fn transaction_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.query.transaction_stats(actor.user_id()) {
        Ok(stats) => dto::ok("Transaction stats retrieved", stats),
        Err(e) => errors::wallet_error_to_response(e),
    }
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = TransactionId::from_str(&id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "Not found");
    };

    match services.query.get_transaction(actor.user_id(), id) {
        Ok(record) => dto::ok("Transaction retrieved", TransactionView::from(record)),
        Err(e) => errors::wallet_error_to_response(e),
    }
}
