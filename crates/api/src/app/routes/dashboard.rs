use std::sync::Arc;

use axum::{Router, extract::Extension, routing::get};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/stats", get(stats))
}

pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.query.dashboard_stats(actor.user_id()) {
        Ok(stats) => dto::ok("Dashboard stats retrieved", stats),
        Err(e) => errors::wallet_error_to_response(e),
    }
}
