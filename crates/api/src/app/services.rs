//! Infrastructure wiring for the HTTP layer.

use std::sync::Arc;

use payvault_auth::Hs256TokenCodec;
use payvault_store::{InMemoryLedgerStore, LedgerStore};
use payvault_wallet::{LedgerQueryService, WalletConfig, WalletService};

#[cfg(feature = "postgres")]
use payvault_store::PostgresLedgerStore;
#[cfg(feature = "postgres")]
use sqlx::PgPool;

/// Everything the handlers need, behind one `Extension`.
pub struct AppServices {
    pub store: Arc<dyn LedgerStore>,
    pub wallet: WalletService,
    pub query: LedgerQueryService,
    pub tokens: Arc<Hs256TokenCodec>,
}

pub fn in_memory_store() -> Arc<dyn LedgerStore> {
    Arc::new(InMemoryLedgerStore::new())
}

#[cfg(feature = "postgres")]
pub async fn postgres_store(pool: PgPool) -> Result<Arc<dyn LedgerStore>, anyhow::Error> {
    let store = PostgresLedgerStore::new(pool);
    store.seed_billers(&payvault_ledger::default_catalog()).await?;
    Ok(Arc::new(store))
}

pub fn build_services(jwt_secret: &str, store: Arc<dyn LedgerStore>) -> AppServices {
    let wallet = WalletService::new(store.clone(), WalletConfig::from_env());
    let query = LedgerQueryService::new(store.clone());
    let tokens = Arc::new(Hs256TokenCodec::new(jwt_secret.as_bytes()));

    AppServices {
        store,
        wallet,
        query,
        tokens,
    }
}
