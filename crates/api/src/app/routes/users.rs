use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    http::StatusCode,
    routing::get,
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/user/profile", get(profile))
        .route("/users/search", get(search))
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.store.account(actor.user_id()) {
        Ok(account) => dto::ok("Profile retrieved", dto::user_to_json(&account)),
        Err(e) => errors::wallet_error_to_response(e.into()),
    }
}

/// Recipient lookup for transfers. Never matches the caller themselves and
/// never exposes the match's balance.
pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let found = match services.store.account_by_email(&query.email) {
        Ok(found) => found,
        Err(e) => return errors::wallet_error_to_response(e.into()),
    };
    match found.filter(|a| a.id != actor.user_id()) {
        Some(account) => dto::ok(
            "User found",
            json!({
                "id": account.id,
                "name": account.name,
                "email": account.email,
            }),
        ),
        None => errors::json_error(StatusCode::NOT_FOUND, "User not found"),
    }
}
