//! Redemption collaborator seam.
//!
//! Claiming a code for a group is done by an external redemption engine.
//! The daemon talks to it only through [`Redeemer`]; when none is configured
//! the dispatcher and the clean-up flow run in their degraded modes.

mod http;

use async_trait::async_trait;
use giftsync_core::{GroupId, RedeemOutcome};
use thiserror::Error;

pub use http::HttpRedeemer;

/// Errors that can occur when calling the redemption engine.
#[derive(Debug, Error)]
pub enum RedeemError {
    /// HTTP client could not be built.
    #[error("redeem client error: {0}")]
    Client(String),

    /// HTTP request failed.
    #[error("redeem request failed: {0}")]
    Request(String),

    /// Engine answered with a non-success status.
    #[error("redeem service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to parse response.
    #[error("redeem response error: {0}")]
    Response(String),
}

/// Claims codes on behalf of groups.
#[async_trait]
pub trait Redeemer: Send + Sync {
    /// Redeem `code` for every member of `group`.
    ///
    /// # Errors
    ///
    /// Returns `RedeemError` if the engine cannot be reached or answers
    /// with something unusable. A negative outcome is not an error.
    async fn redeem(&self, group: &GroupId, code: &str) -> Result<RedeemOutcome, RedeemError>;

    /// Ask what redeeming `code` would return, using a probe account.
    ///
    /// # Errors
    ///
    /// Same as [`Redeemer::redeem`].
    async fn probe(&self, code: &str) -> Result<RedeemOutcome, RedeemError>;
}
