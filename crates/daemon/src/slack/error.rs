//! Slack Web API errors.

use std::time::Duration;

use thiserror::Error;

/// Error codes that point at the recipient rather than at Slack.
const UNREACHABLE_RECIPIENT: &[&str] = &[
    "channel_not_found",
    "user_not_found",
    "not_in_channel",
    "is_archived",
    "cannot_dm_bot",
    "user_disabled",
];

/// Errors that can occur when posting to Slack.
#[derive(Debug, Error)]
pub enum SlackError {
    /// No response arrived.
    #[error("Slack request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP 429.
    #[error("Slack rate limit hit, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-success HTTP status.
    #[error("Slack returned HTTP {0}")]
    Status(u16),

    /// The body was not a Web API envelope.
    #[error("unreadable Slack response: {0}")]
    Decode(String),

    /// `ok: false` with this error code.
    #[error("Slack API error: {0}")]
    Api(String),
}

impl SlackError {
    /// Whether the recipient itself cannot be reached, as opposed to Slack or
    /// the network failing.
    #[must_use]
    pub fn is_unreachable_recipient(&self) -> bool {
        matches!(self, Self::Api(code) if UNREACHABLE_RECIPIENT.contains(&code.as_str()))
    }
}
