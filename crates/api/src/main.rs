#[tokio::main]
async fn main() {
    payvault_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let store = build_store().await;
    let app = payvault_api::app::build_app_with_store(jwt_secret, store);

    let addr = std::env::var("PAYVAULT_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

#[cfg(feature = "postgres")]
async fn build_store() -> std::sync::Arc<dyn payvault_store::LedgerStore> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to postgres");
            payvault_api::app::services::postgres_store(pool)
                .await
                .expect("failed to initialize postgres store")
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            payvault_api::app::services::in_memory_store()
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_store() -> std::sync::Arc<dyn payvault_store::LedgerStore> {
    payvault_api::app::services::in_memory_store()
}
