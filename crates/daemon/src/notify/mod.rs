//! New-code notifications.
//!
//! The dispatcher only sees the [`Notifier`] trait. A recipient is an opaque
//! ID ([`AdminId`]); what it means is up to the implementation. The daemon
//! ships [`SlackNotifier`], which treats it as a Slack user or channel ID.

mod slack;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use giftsync_core::AdminId;
use serde::Serialize;
use thiserror::Error;

pub use slack::SlackNotifier;

/// Title carried by every new-code notice.
pub const NEW_CODE_TITLE: &str = "New Gift Code Found!";

/// Where codes discovered by a sync pass come from.
pub const REMOTE_SOURCE: &str = "Retrieved from the gift code API";

/// Errors that can occur when delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The recipient does not exist or does not accept messages.
    #[error("recipient {recipient} is unreachable: {reason}")]
    RecipientUnreachable { recipient: String, reason: String },

    /// Delivery failed for a reason unrelated to the recipient.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// A structured alert about one newly discovered code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCodeNotice {
    pub title: &'static str,
    pub code: String,
    /// ISO issue date.
    pub date: String,
    pub source: &'static str,
    pub found_at: DateTime<Utc>,
    /// Number of groups the code will be auto-claimed for.
    pub auto_group_count: usize,
}

impl NewCodeNotice {
    /// Notice for a code pulled from the remote.
    #[must_use]
    pub fn from_remote(
        code: impl Into<String>,
        date: impl Into<String>,
        found_at: DateTime<Utc>,
        auto_group_count: usize,
    ) -> Self {
        Self {
            title: NEW_CODE_TITLE,
            code: code.into(),
            date: date.into(),
            source: REMOTE_SOURCE,
            found_at,
            auto_group_count,
        }
    }
}

/// Delivers notices to recipients.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice to one recipient.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if delivery fails. Callers treat every error as
    /// recoverable and per-recipient.
    async fn notify(&self, recipient: &AdminId, notice: &NewCodeNotice) -> Result<(), NotifyError>;
}
