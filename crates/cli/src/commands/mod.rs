//! Subcommand implementations.
//!
//! Store-only commands open the store from `StoreConfig`; commands that talk
//! to the remote build the full [`Services`] from `DaemonConfig`.

pub mod codes;
pub mod migrate;
pub mod settings;
pub mod sync;

use giftsync_daemon::config::{ConfigError, DaemonConfig, StoreConfig};
use giftsync_daemon::db::{RepositoryError, Store};
use giftsync_daemon::services::LifecycleError;
use giftsync_daemon::{DaemonError, Services};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Services could not be built.
    #[error(transparent)]
    Daemon(#[from] DaemonError),

    /// The store failed.
    #[error("Database error: {0}")]
    Storage(#[from] RepositoryError),

    /// An on-demand code operation failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A sync pass stopped early.
    #[error("Sync pass did not complete: {0}")]
    Sync(String),

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Open the configured store and make sure the schema exists.
async fn open_store() -> Result<Store, CommandError> {
    let config = StoreConfig::from_env();
    tracing::info!(database_url = %config.database_url, "Opening store");

    let store = Store::open(&config.database_url).await?;
    store.ensure_schema().await?;
    Ok(store)
}

/// Build every service from the full daemon configuration.
async fn services() -> Result<Services, CommandError> {
    let config = DaemonConfig::from_env()?;
    let (services, reports) = Services::from_config(&config).await?;

    let imported: u64 = reports.iter().map(|r| r.imported).sum();
    if imported > 0 {
        tracing::info!(imported, "Legacy rows imported");
    }

    Ok(services)
}

/// Print a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let rendered = serde_json::to_string_pretty(value)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}
