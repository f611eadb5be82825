//! Remote API errors.

use thiserror::Error;

/// Errors that can occur when talking to the remote gift code API.
///
/// [`RemoteError::Transport`] is a transport failure (connect, TLS, timeout).
/// Every other variant is a protocol failure: the remote answered, but not
/// with something we can act on.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed before a response arrived.
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote answered with a non-200 status.
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Remote answered 200 with nothing in the body.
    #[error("remote returned an empty body")]
    EmptyBody,

    /// Body was not the JSON we expected.
    #[error("malformed remote response: {0}")]
    Decode(String),

    /// Remote reported an explicit error payload.
    #[error("remote API error: {0}")]
    Api(String),

    /// Remote did not confirm a write.
    #[error("remote did not confirm the write{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected(Option<String>),

    /// Client could not be configured.
    #[error("remote client configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::EmptyBody => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::Api(_) | Self::Rejected(_) | Self::Config(_) => false,
        }
    }
}

/// Keep logged bodies short.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() <= MAX_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_CHARS).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RemoteError::EmptyBody.is_transient());
        assert!(
            RemoteError::Status {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            RemoteError::Status {
                status: 429,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !RemoteError::Status {
                status: 403,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!RemoteError::Api("bad key".into()).is_transient());
        assert!(!RemoteError::Rejected(None).is_transient());
    }

    #[test]
    fn test_rejected_display() {
        assert_eq!(
            RemoteError::Rejected(None).to_string(),
            "remote did not confirm the write"
        );
        assert_eq!(
            RemoteError::Rejected(Some("unknown code".into())).to_string(),
            "remote did not confirm the write: unknown code"
        );
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "é".repeat(250);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), 201);
        assert!(truncated.ends_with('…'));
    }
}
