//! New-code dispatch: admin notifications and group auto-claim.
//!
//! Every failure here is per item. An unreachable admin, a failed delivery
//! or a failed redemption is logged, counted and skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::throttle;
use crate::db::{RepositoryError, Store};
use crate::notify::{NewCodeNotice, Notifier, NotifyError};
use crate::redeem::Redeemer;

/// A code inserted by the current pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCode {
    pub code: String,
    /// ISO issue date.
    pub date: String,
}

/// What one dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Primary admins found.
    pub recipients: usize,
    /// Auto-claim groups found.
    pub groups: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    /// Subset of failures where the recipient itself was unreachable.
    pub recipients_unreachable: usize,
    pub redemptions_attempted: usize,
    pub redemptions_failed: usize,
    /// No notifier configured; notifications skipped.
    pub notifier_absent: bool,
    /// No redemption collaborator configured; auto-claim skipped.
    pub redeemer_absent: bool,
}

/// Fans new codes out to admins and auto-claim groups.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Option<Arc<dyn Notifier>>,
    redeemer: Option<Arc<dyn Redeemer>>,
    redeem_delay: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("notifier", &self.notifier.is_some())
            .field("redeemer", &self.redeemer.is_some())
            .field("redeem_delay", &self.redeem_delay)
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher. Either collaborator may be absent.
    #[must_use]
    pub fn new(
        notifier: Option<Arc<dyn Notifier>>,
        redeemer: Option<Arc<dyn Redeemer>>,
        redeem_delay: Duration,
    ) -> Self {
        if notifier.is_none() {
            warn!("Notifier not configured - new codes will not be announced");
        }
        if redeemer.is_none() {
            warn!("Redemption collaborator not configured - auto-claim disabled");
        }

        Self {
            notifier,
            redeemer,
            redeem_delay,
        }
    }

    /// Notify primary admins about `new_codes` and redeem them for every
    /// auto-claim group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` only if recipients or groups cannot be read;
    /// nothing has been sent at that point.
    #[instrument(skip(self, store, new_codes), fields(new_codes = new_codes.len()))]
    pub async fn dispatch(
        &self,
        store: &Store,
        new_codes: &[NewCode],
    ) -> Result<DispatchReport, RepositoryError> {
        let groups = store.groups().list_auto_claim_groups().await?;
        let admins = store.admins().list_primary_admins().await?;

        let mut report = DispatchReport {
            recipients: admins.len(),
            groups: groups.len(),
            ..DispatchReport::default()
        };

        match &self.notifier {
            Some(notifier) => {
                let found_at = Utc::now();
                for new in new_codes {
                    let notice =
                        NewCodeNotice::from_remote(&new.code, &new.date, found_at, groups.len());
                    for admin in &admins {
                        match notifier.notify(admin, &notice).await {
                            Ok(()) => report.notifications_sent += 1,
                            Err(e @ NotifyError::RecipientUnreachable { .. }) => {
                                debug!(admin = %admin, error = %e, "Admin unreachable, skipping");
                                report.notifications_failed += 1;
                                report.recipients_unreachable += 1;
                            }
                            Err(e) => {
                                warn!(admin = %admin, code = %new.code, error = %e, "Notification failed");
                                report.notifications_failed += 1;
                            }
                        }
                    }
                }
            }
            None => report.notifier_absent = true,
        }

        if !groups.is_empty() {
            match &self.redeemer {
                Some(redeemer) => {
                    let mut calls = 0;
                    for group in &groups {
                        for new in new_codes {
                            throttle(calls, self.redeem_delay).await;
                            calls += 1;
                            report.redemptions_attempted += 1;

                            match redeemer.redeem(group, &new.code).await {
                                Ok(outcome) => {
                                    info!(group = %group, code = %new.code, %outcome, "Auto-claim finished");
                                }
                                Err(e) => {
                                    warn!(group = %group, code = %new.code, error = %e, "Auto-claim failed");
                                    report.redemptions_failed += 1;
                                }
                            }
                        }
                    }
                }
                None => {
                    warn!(
                        groups = groups.len(),
                        "Auto-claim groups present but no redemption collaborator; notification only"
                    );
                    report.redeemer_absent = true;
                }
            }
        }

        Ok(report)
    }
}
