use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;

use payvault_auth::{hash_password, verify_password};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/user", get(current_user))
        .route("/auth/logout", post(logout))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    if body.password.len() < 8 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "password must be at least 8 characters",
        );
    }

    let password_hash = hash_password(&body.password);
    let account = match services.wallet.register(&body.name, &body.email, &password_hash) {
        Ok(account) => account,
        Err(e) => return errors::wallet_error_to_response(e),
    };

    let token = match services
        .tokens
        .issue(account.id, &account.name, &account.email, Utc::now())
    {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to mint token");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong");
        }
    };

    dto::success(
        StatusCode::CREATED,
        "User registered successfully",
        serde_json::json!({
            "user": dto::user_to_json(&account),
            "token": token,
        }),
    )
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let credentials = match services.store.credentials(&body.email) {
        Ok(c) => c,
        Err(e) => return errors::wallet_error_to_response(e.into()),
    };
    // Same response whether the email is unknown or the password is wrong.
    let Some((account, stored_hash)) = credentials else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };
    if !verify_password(&body.password, &stored_hash) {
        return errors::json_error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let token = match services
        .tokens
        .issue(account.id, &account.name, &account.email, Utc::now())
    {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to mint token");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong");
        }
    };

    tracing::info!(user_id = %account.id, "user logged in");
    dto::ok(
        "Login successful",
        serde_json::json!({
            "user": dto::user_to_json(&account),
            "token": token,
        }),
    )
}

/// Tokens are stateless; logout is the client discarding its token. The
/// route exists so the table matches what clients already call.
pub async fn logout(Extension(actor): Extension<ActorContext>) -> axum::response::Response {
    tracing::info!(user_id = %actor.user_id(), "user logged out");
    dto::ok("Logged out successfully", serde_json::Value::Null)
}

pub async fn current_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.store.account(actor.user_id()) {
        Ok(account) => dto::ok("User retrieved", dto::user_to_json(&account)),
        Err(e) => errors::wallet_error_to_response(e.into()),
    }
}
