//! Wallet operation configuration.

use payvault_core::Money;

/// Per-request limits applied by the operation layer.
#[derive(Debug, Clone, Copy)]
pub struct WalletConfig {
    /// Maximum amount of a single top-up.
    pub topup_ceiling: Money,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            topup_ceiling: Money::from_cents(1_000_000), // 10,000.00
        }
    }
}

impl WalletConfig {
    /// Read overrides from the environment (`PAYVAULT_TOPUP_CEILING`,
    /// major units). Falls back to the default on absence or parse failure.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("PAYVAULT_TOPUP_CEILING") {
            match raw.parse::<f64>().map_err(|e| e.to_string()).and_then(|v| {
                Money::from_major(v).map_err(|e| e.to_string())
            }) {
                Ok(ceiling) if ceiling.is_positive() => config.topup_ceiling = ceiling,
                _ => {
                    tracing::warn!(raw, "ignoring invalid PAYVAULT_TOPUP_CEILING");
                }
            }
        }
        config
    }
}
