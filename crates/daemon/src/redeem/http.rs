//! HTTP redemption engine client.
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | redeem | `POST {base}/redeem` `{"group_id", "code"}` | `{"outcome": "OK"}` |
//! | probe | `POST {base}/probe` `{"player_id", "code"}` | `{"outcome": "USAGE_LIMIT"}` |
//!
//! Unknown outcome strings map to [`RedeemOutcome::Other`].

use async_trait::async_trait;
use giftsync_core::{GroupId, RedeemOutcome};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{RedeemError, Redeemer};
use crate::config::RedeemConfig;

#[derive(Serialize)]
struct RedeemRequest<'a> {
    group_id: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct ProbeRequest<'a> {
    player_id: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct OutcomeResponse {
    outcome: String,
}

/// [`Redeemer`] backed by an HTTP redemption service.
#[derive(Debug, Clone)]
pub struct HttpRedeemer {
    client: Client,
    base_url: Url,
    probe_player_id: String,
}

impl HttpRedeemer {
    /// Create a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns `RedeemError::Client` if the HTTP client cannot be built.
    pub fn new(config: &RedeemConfig) -> Result<Self, RedeemError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RedeemError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            probe_player_id: config.probe_player_id.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, RedeemError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(path)
            .map_err(|e| RedeemError::Request(format!("invalid redeem URL: {e}")))
    }

    async fn call<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<RedeemOutcome, RedeemError> {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| RedeemError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RedeemError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OutcomeResponse = response
            .json()
            .await
            .map_err(|e| RedeemError::Response(e.to_string()))?;

        let outcome = parsed
            .outcome
            .parse::<RedeemOutcome>()
            .unwrap_or(RedeemOutcome::Other);
        debug!(%outcome, "Redeem service answered");

        Ok(outcome)
    }
}

#[async_trait]
impl Redeemer for HttpRedeemer {
    #[instrument(skip(self), fields(group = %group))]
    async fn redeem(&self, group: &GroupId, code: &str) -> Result<RedeemOutcome, RedeemError> {
        self.call(
            "redeem",
            &RedeemRequest {
                group_id: group.as_str(),
                code,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn probe(&self, code: &str) -> Result<RedeemOutcome, RedeemError> {
        self.call(
            "probe",
            &ProbeRequest {
                player_id: &self.probe_player_id,
                code,
            },
        )
        .await
    }
}
