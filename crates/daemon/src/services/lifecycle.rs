//! On-demand code operations.
//!
//! These run outside the scheduler, concurrently with sync passes. Each one
//! either fully commits (remote and local) or reports failure and leaves the
//! store untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use giftsync_core::{CodeError, GiftCode, IssuedDate, RedeemOutcome};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::throttle;
use crate::db::{RepositoryError, Store};
use crate::redeem::Redeemer;
use crate::remote::{RemoteClient, RemoteError};

/// Errors returned by on-demand operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The code is already stored locally.
    #[error("code {0} already exists")]
    AlreadyExists(String),

    /// Removal was requested without validation.
    #[error("refusing to remove {0} without validation")]
    NotValidated(String),

    /// The code is not a well-formed gift code.
    #[error("invalid code: {0}")]
    InvalidCode(#[from] CodeError),

    /// The remote did not accept the change.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local store failed.
    #[error(transparent)]
    Storage(#[from] RepositoryError),

    /// The operation needs a redemption collaborator and none is configured.
    #[error("no redemption collaborator configured")]
    CollaboratorAbsent,
}

/// Confirmation required by [`CodeLifecycle::remove_code`].
///
/// Defaults to [`RemovalGuard::Unconfirmed`], which refuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalGuard {
    /// No evidence that the code should go. Removal is refused.
    #[default]
    Unconfirmed,
    /// The code was confirmed dead (e.g. by a validation probe).
    Validated,
}

/// What [`CodeLifecycle::validate_and_clean_all`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// Codes probed.
    pub checked: usize,
    /// Codes removed, with the outcome that condemned them.
    pub removed: Vec<(String, RedeemOutcome)>,
    /// Codes whose probe or removal failed; they stay in place.
    pub failures: usize,
}

/// On-demand add/remove/check/clean.
#[derive(Clone)]
pub struct CodeLifecycle {
    remote: RemoteClient,
    store: Arc<Store>,
    redeemer: Option<Arc<dyn Redeemer>>,
    validate_delay: Duration,
}

impl std::fmt::Debug for CodeLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeLifecycle")
            .field("remote", &self.remote)
            .field("redeemer", &self.redeemer.is_some())
            .field("validate_delay", &self.validate_delay)
            .finish_non_exhaustive()
    }
}

impl CodeLifecycle {
    /// Create the lifecycle API.
    #[must_use]
    pub fn new(
        remote: RemoteClient,
        store: Arc<Store>,
        redeemer: Option<Arc<dyn Redeemer>>,
        validate_delay: Duration,
    ) -> Self {
        Self {
            remote,
            store,
            redeemer,
            validate_delay,
        }
    }

    /// Add a code, dated today, to the remote and then to the store.
    ///
    /// # Errors
    ///
    /// - `InvalidCode` if the code is not alphanumeric (no I/O is done)
    /// - `AlreadyExists` if it is already stored (no remote call is made)
    /// - `Remote` if the remote refuses it (the store is not touched)
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn add_code(&self, code: &str) -> Result<GiftCode, LifecycleError> {
        let code = GiftCode::parse(code)?;

        if self.store.gift_codes().exists(code.as_str()).await? {
            return Err(LifecycleError::AlreadyExists(code.into_inner()));
        }

        let today = IssuedDate::new(Utc::now().date_naive());
        self.remote.upsert_code(code.as_str(), today).await?;

        let inserted = self
            .store
            .gift_codes()
            .insert_code_if_absent(code.as_str(), &today.to_iso())
            .await?;
        if !inserted {
            debug!(code = %code, "Code appeared locally while adding");
        }

        info!(code = %code, date = %today, "Code added");
        Ok(code)
    }

    /// Remove a code remotely and then, with its claims, locally.
    ///
    /// Returns whether the code was stored locally.
    ///
    /// # Errors
    ///
    /// - `NotValidated` unless `guard` is [`RemovalGuard::Validated`]; nothing
    ///   is called or changed
    /// - `Remote` if the remote does not confirm the delete; the store is not
    ///   touched
    /// - `Storage` if the local delete fails; it is rolled back
    #[instrument(skip(self))]
    pub async fn remove_code(&self, code: &str, guard: RemovalGuard) -> Result<bool, LifecycleError> {
        if guard != RemovalGuard::Validated {
            warn!(code, "Unvalidated removal refused");
            return Err(LifecycleError::NotValidated(code.to_string()));
        }

        self.remote.delete_code(code).await?;
        let existed = self.store.gift_codes().delete_code_cascade(code).await?;

        info!(code, existed, "Code removed");
        Ok(existed)
    }

    /// Ask the remote whether it knows a code.
    ///
    /// Fail-closed: any error is logged and reported as `false`.
    #[instrument(skip(self))]
    pub async fn check_code(&self, code: &str) -> bool {
        match self.remote.check_code(code).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(code, error = %e, "Code check failed");
                false
            }
        }
    }

    /// Probe every stored code through the redemption collaborator and remove
    /// the ones it reports as expired, unknown or used up.
    ///
    /// # Errors
    ///
    /// - `CollaboratorAbsent` if no redemption collaborator is configured
    /// - `Storage` if the stored codes cannot be listed
    ///
    /// Per-code failures are counted in the report, not returned.
    #[instrument(skip(self))]
    pub async fn validate_and_clean_all(&self) -> Result<CleanReport, LifecycleError> {
        let Some(redeemer) = &self.redeemer else {
            warn!("Validation requested but no redemption collaborator is configured");
            return Err(LifecycleError::CollaboratorAbsent);
        };

        let codes = self.store.gift_codes().list_codes().await?;
        let mut report = CleanReport::default();

        for (index, code) in codes.keys().enumerate() {
            throttle(index, self.validate_delay).await;
            report.checked += 1;

            let outcome = match redeemer.probe(code).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(code = %code, error = %e, "Validation probe failed");
                    report.failures += 1;
                    continue;
                }
            };

            if !outcome.is_terminal() {
                debug!(code = %code, %outcome, "Code still valid");
                continue;
            }

            match self.remove_code(code, RemovalGuard::Validated).await {
                Ok(_) => report.removed.push((code.clone(), outcome)),
                Err(e) => {
                    warn!(code = %code, %outcome, error = %e, "Removal of dead code failed");
                    report.failures += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            removed = report.removed.len(),
            failures = report.failures,
            "Validation finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_defaults_to_refusal() {
        assert_eq!(RemovalGuard::default(), RemovalGuard::Unconfirmed);
    }
}
