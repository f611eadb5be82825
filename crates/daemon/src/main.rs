//! giftsync daemon - gift code reconciliation service.
//!
//! Keeps `db/app.sqlite` and the remote gift code API in sync on a fixed
//! schedule, and serves health/status on port 3002.
//!
//! # Startup
//!
//! 1. Load configuration, start telemetry
//! 2. Open the store (owned), ensure the schema, import legacy stores
//! 3. Build the remote client, notifier and redemption collaborator
//! 4. Spawn the scheduler and serve `/health`, `/health/ready`, `/status`
//!
//! On Ctrl+C or SIGTERM the server drains, the scheduler finishes its
//! current pass, and the store is closed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use giftsync_daemon::config::DaemonConfig;
use giftsync_daemon::services::Scheduler;
use giftsync_daemon::state::AppState;
use giftsync_daemon::{DaemonError, Services, routes, telemetry};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, watch};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        // Only fails if a provider is already installed.
        warn!("rustls crypto provider already installed");
    }

    let config = match DaemonConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("giftsync-daemon: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    let _telemetry = telemetry::init(&config);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Daemon stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &DaemonConfig) -> Result<(), DaemonError> {
    let (services, imports) = Services::from_config(config).await?;
    let imported: u64 = imports.iter().map(|report| report.imported).sum();
    info!(
        database_url = %config.database_url,
        remote = %config.remote.endpoint,
        legacy_rows = imported,
        "Services ready"
    );

    let last_pass = Arc::new(RwLock::new(None));
    let (stop_scheduler, stop_rx) = watch::channel(false);
    let scheduler = tokio::spawn(
        Scheduler::new(services.engine.clone(), config.schedule, Arc::clone(&last_pass))
            .run(stop_rx),
    );

    let app = routes::app(AppState::new(Arc::clone(&services.store), last_pass));
    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!(addr = %config.socket_addr(), "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_requested())
        .await;

    let _ = stop_scheduler.send(true);
    if let Err(e) = scheduler.await {
        error!(error = %e, "Scheduler task panicked");
    }
    services.store.close().await;
    info!("Shutdown complete");

    served.map_err(DaemonError::from)
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_requested() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown requested");
}
