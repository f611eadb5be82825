//! Daemon-level errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::redeem::RedeemError;
use crate::remote::RemoteError;
use crate::slack::SlackError;

/// Errors raised while wiring or serving the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store could not be opened or queried.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// The remote client could not be built.
    #[error("remote client error: {0}")]
    Remote(#[from] RemoteError),

    /// The Slack client could not be built.
    #[error("slack client error: {0}")]
    Slack(#[from] SlackError),

    /// The redemption client could not be built.
    #[error("redeem client error: {0}")]
    Redeem(#[from] RedeemError),

    /// Socket or filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for DaemonError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Request error"
        );

        let status = match &self {
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Remote(_) | Self::Slack(_) | Self::Redeem(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Don't expose internal error details to clients
        (status, status.canonical_reason().unwrap_or("error")).into_response()
    }
}
