//! One-shot reconciliation pass.

use giftsync_daemon::services::SyncOutcome;

use super::{CommandError, print_json, services};

/// Run a single pass and print its report.
///
/// A pass that ends in a remote error or abort is a failed command.
pub async fn run() -> Result<(), CommandError> {
    let services = services().await?;
    let outcome = services.engine.sync_once().await;
    services.store.close().await;

    let retryable = outcome.is_retryable();
    match outcome {
        SyncOutcome::Success(report) => print_json(&report),
        SyncOutcome::RemoteError(message) => Err(CommandError::Sync(format!(
            "remote reported an error: {message}"
        ))),
        SyncOutcome::Aborted(reason) => Err(CommandError::Sync(format!(
            "{reason} (retryable: {retryable})"
        ))),
    }
}
