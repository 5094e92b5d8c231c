//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset: wallet crates at `info`,
/// chatty dependencies quieted. Money-movement audit events are emitted at
/// `info`, so they are always on by default.
const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn,tower=warn";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // JSON logs with targets kept, so audit events are attributable to the
    // emitting crate. Override via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
