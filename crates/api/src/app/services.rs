//! Infrastructure wiring for the HTTP application.

use std::sync::Arc;
use std::time::Duration;

use stockbook_inventory::ItemLedger;
use stockbook_transactions::{Config, TransactionEngine, TransactionLog};

/// Shared application services: the engine plus direct handles to the
/// ledger and log for the administrative item endpoints.
pub struct AppServices {
    pub engine: TransactionEngine,
    pub ledger: Arc<ItemLedger>,
}

/// Build the in-memory service graph.
pub fn build_services() -> AppServices {
    let ledger = Arc::new(ItemLedger::new());
    let log = Arc::new(TransactionLog::new());
    let engine = TransactionEngine::new(Arc::clone(&ledger), Arc::clone(&log), config_from_env());

    AppServices { engine, ledger }
}

/// Engine configuration from the environment, falling back to defaults.
fn config_from_env() -> Config {
    let mut config = Config::default();

    if let Ok(raw) = std::env::var("LOCK_TIMEOUT_MS") {
        match raw.parse::<u64>() {
            Ok(ms) => config.lock_timeout = Duration::from_millis(ms),
            Err(_) => tracing::warn!("ignoring malformed LOCK_TIMEOUT_MS: {raw}"),
        }
    }

    if let Ok(raw) = std::env::var("MAX_PAGE_SIZE") {
        match raw.parse::<u32>() {
            Ok(n) if n > 0 => config.max_page_size = n,
            _ => tracing::warn!("ignoring malformed MAX_PAGE_SIZE: {raw}"),
        }
    }

    config
}
