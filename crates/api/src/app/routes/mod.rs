use axum::Router;

pub mod auth;
pub mod billers;
pub mod dashboard;
pub mod system;
pub mod transactions;
pub mod users;
pub mod wallet;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(auth::protected_router())
        .merge(users::router())
        .merge(wallet::router())
        .nest("/billers", billers::router())
        .nest("/transactions", transactions::router())
        .nest("/dashboard", dashboard::router())
}
