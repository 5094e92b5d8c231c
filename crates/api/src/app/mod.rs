//! HTTP API application wiring (Axum router + service wiring).
//!
//! Structure:
//! - `services.rs`: infrastructure wiring (ledger store, wallet operations,
//!   query service, token codec)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use payvault_store::LedgerStore;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Uses the in-memory store with the seeded biller catalog; for a durable
/// backend, wire a store through [`build_app_with_store`].
pub fn build_app(jwt_secret: String) -> Router {
    build_app_with_store(jwt_secret, services::in_memory_store())
}

pub fn build_app_with_store(jwt_secret: String, store: Arc<dyn LedgerStore>) -> Router {
    let services = Arc::new(services::build_services(&jwt_secret, store));
    let auth_state = middleware::AuthState {
        jwt: services.tokens.clone(),
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::auth::public_router().layer(Extension(services)))
        .merge(protected)
}
