//! Slack-backed [`Notifier`].

use async_trait::async_trait;
use giftsync_core::AdminId;
use tracing::instrument;

use super::{NewCodeNotice, Notifier, NotifyError};
use crate::config::SlackConfig;
use crate::slack::{SlackClient, SlackError, build_new_code_message};

/// Posts new-code notices to Slack; the recipient ID is the channel.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: SlackClient,
}

impl SlackNotifier {
    /// Create a notifier around an existing client.
    #[must_use]
    pub const fn new(client: SlackClient) -> Self {
        Self { client }
    }

    /// Create a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SlackError` if the Slack client cannot be built.
    pub fn from_config(config: &SlackConfig) -> Result<Self, SlackError> {
        SlackClient::new(config.bot_token.clone()).map(Self::new)
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    #[instrument(skip(self, notice), fields(recipient = %recipient, code = %notice.code))]
    async fn notify(&self, recipient: &AdminId, notice: &NewCodeNotice) -> Result<(), NotifyError> {
        let blocks = build_new_code_message(
            notice.title,
            &notice.code,
            &notice.date,
            notice.source,
            notice.found_at,
            notice.auto_group_count,
        );
        let fallback = format!("{}: {}", notice.title, notice.code);

        self.client
            .post_message(recipient.as_str(), &fallback, &blocks)
            .await
            .map(|_| ())
            .map_err(|e| {
                if e.is_unreachable_recipient() {
                    NotifyError::RecipientUnreachable {
                        recipient: recipient.to_string(),
                        reason: e.to_string(),
                    }
                } else {
                    NotifyError::Delivery(e.to_string())
                }
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    fn notifier(server: &MockServer) -> SlackNotifier {
        SlackNotifier::new(SlackClient::with_api_base(
            SecretString::from("xoxb-test"),
            server.base_url(),
        )
        .unwrap())
    }

    #[tokio::test]
    async fn test_unreachable_recipient_is_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat.postMessage");
                then.status(200)
                    .json_body(json!({"ok": false, "error": "user_not_found"}));
            })
            .await;

        let notice = NewCodeNotice::from_remote("ABC123", "2024-06-01", Utc::now(), 0);
        let err = notifier(&server)
            .notify(&AdminId::from("U404"), &notice)
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::RecipientUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_other_failures_are_delivery_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat.postMessage");
                then.status(200)
                    .json_body(json!({"ok": false, "error": "ratelimited"}));
            })
            .await;

        let notice = NewCodeNotice::from_remote("ABC123", "2024-06-01", Utc::now(), 2);
        let err = notifier(&server)
            .notify(&AdminId::from("U1"), &notice)
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Delivery(_)));
    }
}
