//! Remote gift code API client.
//!
//! Stateless wrapper over the four calls the endpoint supports. Every request
//! carries the shared API key; TLS verification follows
//! [`RemoteApiConfig::accept_invalid_certs`].

use std::sync::Arc;

use giftsync_core::IssuedDate;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::{RemoteError, truncate_body};
use super::types::{
    CheckResponse, CodeListing, DeleteBody, UpsertBody, WriteAck, parse_listing,
};
use crate::config::RemoteApiConfig;

/// API key header.
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Remote gift code API client.
#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    client: reqwest::Client,
    endpoint: Url,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl RemoteClient {
    /// Create a new remote API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &RemoteApiConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();

        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| RemoteError::Config(format!("invalid API key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if config.accept_invalid_certs {
            warn!(
                endpoint = %config.endpoint,
                "TLS certificate verification is disabled for the gift code API"
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            inner: Arc::new(RemoteClientInner {
                client,
                endpoint: config.endpoint.clone(),
            }),
        })
    }

    /// The endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// List every code line the remote knows about.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-200 status, an empty or
    /// malformed body, or an explicit `{"error": ...}` payload.
    #[instrument(skip(self))]
    pub async fn fetch_codes(&self) -> Result<CodeListing, RemoteError> {
        let response = self
            .inner
            .client
            .get(self.inner.endpoint.clone())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let listing = parse_listing(&body, status.as_u16())?;
        debug!(lines = listing.lines.len(), "Fetched remote code listing");

        Ok(listing)
    }

    /// Create or refresh a code on the remote.
    ///
    /// The date is sent in `DD.MM.YYYY` form. A 200 whose body is not JSON,
    /// or omits `success`, counts as applied; only an explicit
    /// `"success": false` is a rejection.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-200 status, or an explicit
    /// rejection.
    #[instrument(skip(self), fields(date = %date.to_dotted()))]
    pub async fn upsert_code(&self, code: &str, date: IssuedDate) -> Result<(), RemoteError> {
        let body = UpsertBody {
            code,
            date: date.to_dotted(),
        };

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let ack: WriteAck = serde_json::from_str(&text).unwrap_or_default();
        if ack.success == Some(false) {
            return Err(RemoteError::Rejected(ack.detail()));
        }

        debug!("Remote upsert applied");
        Ok(())
    }

    /// Delete a code on the remote.
    ///
    /// Deletion is only confirmed by a 200 carrying `"success": true`.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-200 status, a body that is
    /// not JSON, or a missing confirmation.
    #[instrument(skip(self))]
    pub async fn delete_code(&self, code: &str) -> Result<(), RemoteError> {
        let response = self
            .inner
            .client
            .delete(self.inner.endpoint.clone())
            .json(&DeleteBody { code })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let ack: WriteAck =
            serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))?;
        if ack.success != Some(true) {
            return Err(RemoteError::Rejected(ack.detail()));
        }

        debug!("Remote delete confirmed");
        Ok(())
    }

    /// Ask the remote whether it knows a code.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-200 status or a body that is
    /// not JSON. A JSON body without `exists` means "does not exist".
    #[instrument(skip(self))]
    pub async fn check_code(&self, code: &str) -> Result<bool, RemoteError> {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "check")
            .append_pair("giftcode", code);

        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let check: CheckResponse =
            serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))?;

        Ok(check.exists)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    const KEY: &str = "test-key-7f3a";

    fn client_for(server: &MockServer) -> RemoteClient {
        RemoteClient::new(&RemoteApiConfig {
            endpoint: Url::parse(&server.url("/giftcode_api.php")).unwrap(),
            api_key: SecretString::from(KEY),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn date(s: &str) -> IssuedDate {
        IssuedDate::parse_dotted(s).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_codes_sends_api_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/giftcode_api.php")
                    .header("x-api-key", KEY);
                then.status(200)
                    .json_body(json!({"codes": ["ABC123 01.06.2024"]}));
            })
            .await;

        let listing = client_for(&server).fetch_codes().await.unwrap();

        mock.assert_async().await;
        assert_eq!(listing.lines, vec!["ABC123 01.06.2024"]);
    }

    #[tokio::test]
    async fn test_fetch_codes_non_200() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/giftcode_api.php");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = client_for(&server).fetch_codes().await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 502, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_upsert_sends_dotted_date() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/giftcode_api.php")
                    .header("x-api-key", KEY)
                    .json_body(json!({"code": "FREE50", "date": "09.01.2025"}));
                then.status(200).json_body(json!({"success": true}));
            })
            .await;

        client_for(&server)
            .upsert_code("FREE50", date("09.01.2025"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upsert_tolerates_non_json_ack() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("ok");
            })
            .await;

        assert!(
            client_for(&server)
                .upsert_code("FREE50", date("09.01.2025"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_upsert_explicit_rejection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .json_body(json!({"success": false, "message": "duplicate"}));
            })
            .await;

        let err = client_for(&server)
            .upsert_code("FREE50", date("09.01.2025"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(Some(m)) if m == "duplicate"));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).json_body(json!({"code": "GONE"}));
                then.status(200).json_body(json!({"success": true}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).json_body(json!({"code": "STAYS"}));
                then.status(200).json_body(json!({"message": "noop"}));
            })
            .await;

        let client = client_for(&server);
        assert!(client.delete_code("GONE").await.is_ok());
        assert!(matches!(
            client.delete_code("STAYS").await,
            Err(RemoteError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_check_code() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/giftcode_api.php")
                    .query_param("action", "check")
                    .query_param("giftcode", "FREE50");
                then.status(200).json_body(json!({"exists": true}));
            })
            .await;

        assert!(client_for(&server).check_code("FREE50").await.unwrap());
        mock.assert_async().await;
    }

    #[test]
    fn test_debug_hides_key() {
        let client = RemoteClient::new(&RemoteApiConfig {
            endpoint: Url::parse("https://codes.test/api").unwrap(),
            api_key: SecretString::from(KEY),
            accept_invalid_certs: true,
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("codes.test"));
        assert!(!debug_output.contains(KEY));
    }
}
