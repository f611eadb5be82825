//! Store preparation.
//!
//! # Usage
//!
//! ```bash
//! giftsync migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GIFTSYNC_DATABASE_URL` - `SQLite` store (default: `sqlite://db/app.sqlite`)
//! - `GIFTSYNC_LEGACY_DIR` - Directory holding pre-merge stores (default: `db`)

use giftsync_daemon::config::StoreConfig;

use super::{CommandError, open_store, print_json};

/// Create the schema and import any legacy stores found, printing one report
/// per legacy source.
pub async fn run() -> Result<(), CommandError> {
    let config = StoreConfig::from_env();
    let store = open_store().await?;

    tracing::info!(legacy_dir = %config.legacy_dir.display(), "Importing legacy stores");
    let reports = store.migrate_legacy_if_present(&config.legacy_dir).await;

    let codes = store.gift_codes().count().await?;
    tracing::info!(codes, "Store ready");
    store.close().await;

    print_json(&reports)
}
