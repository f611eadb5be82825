//! One reconciliation pass between the local store and the remote API.
//!
//! # Pass
//!
//! 1. Snapshot local codes
//! 2. Pull the remote listing (failure aborts with no mutation)
//! 3. Classify every line with [`parse_line`]
//! 4. Ask the remote to delete every invalid line
//! 5. Insert valid codes not in the snapshot, in one transaction
//! 6. Dispatch the newly inserted codes
//! 7. Push every snapshot code back to the remote
//!
//! Steps 3-7 never abort the pass: item failures are logged and counted in
//! the [`SyncReport`]. A code the remote lists as invalid is deleted remotely
//! but never locally; local removal only happens through validated removal.

use std::collections::BTreeMap;
use std::sync::Arc;

use giftsync_core::{IssuedDate, leading_token, parse_line};
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::dispatch::{DispatchReport, Dispatcher, NewCode};
use super::throttle;
use crate::config::ThrottleConfig;
use crate::db::{RepositoryError, Store};
use crate::remote::{RemoteClient, RemoteError};

/// Why a pass stopped before touching anything.
#[derive(Debug, thiserror::Error)]
pub enum AbortReason {
    /// The listing could not be fetched or decoded.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local snapshot could not be read.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Result of one pass.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The pass ran to completion (item failures are in the report).
    Success(SyncReport),
    /// The remote answered with an explicit `{"error": ...}` payload.
    RemoteError(String),
    /// The pass stopped before any mutation.
    Aborted(AbortReason),
}

impl SyncOutcome {
    /// Short machine-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::RemoteError(_) => "remote_error",
            Self::Aborted(_) => "aborted",
        }
    }

    /// Whether the next pass can be expected to do better without anyone
    /// intervening.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Success(_) | Self::RemoteError(_) => false,
            Self::Aborted(AbortReason::Remote(e)) => e.is_transient(),
            Self::Aborted(AbortReason::Storage(_)) => true,
        }
    }

    /// The report, if the pass completed.
    #[must_use]
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::RemoteError(_) | Self::Aborted(_) => None,
        }
    }
}

/// What a completed pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Codes in the local snapshot.
    pub local_codes: usize,
    /// Lines in the remote listing.
    pub pulled: usize,
    pub valid: usize,
    /// Raw invalid lines, in listing order.
    pub invalid: Vec<String>,
    pub deletes_attempted: usize,
    pub deletes_failed: usize,
    /// Codes inserted by this pass.
    pub new_codes: Vec<String>,
    pub inserts_failed: usize,
    /// Whether the insert batch committed.
    pub insert_committed: bool,
    pub dispatch: Option<DispatchReport>,
    pub dispatch_error: Option<String>,
    pub pushed: usize,
    pub pushes_failed: usize,
}

/// Runs reconciliation passes.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    remote: RemoteClient,
    store: Arc<Store>,
    dispatcher: Dispatcher,
    throttle: ThrottleConfig,
}

impl SyncEngine {
    /// Create an engine.
    #[must_use]
    pub const fn new(
        remote: RemoteClient,
        store: Arc<Store>,
        dispatcher: Dispatcher,
        throttle: ThrottleConfig,
    ) -> Self {
        Self {
            remote,
            store,
            dispatcher,
            throttle,
        }
    }

    /// Run one pass. Never panics and never returns an error: every failure
    /// is folded into the outcome.
    pub async fn sync_once(&self) -> SyncOutcome {
        let span = info_span!("sync_pass", pass_id = %Uuid::new_v4());
        let outcome = self.run_pass().instrument(span.clone()).await;

        span.in_scope(|| match &outcome {
            SyncOutcome::Success(report) => info!(
                pulled = report.pulled,
                invalid = report.invalid.len(),
                new_codes = report.new_codes.len(),
                pushed = report.pushed,
                "Sync pass complete"
            ),
            SyncOutcome::RemoteError(message) => {
                warn!(error = %message, "Remote reported an error; pass skipped");
            }
            SyncOutcome::Aborted(reason) => warn!(
                error = %reason,
                retryable = outcome.is_retryable(),
                "Sync pass aborted"
            ),
        });

        outcome
    }

    async fn run_pass(&self) -> SyncOutcome {
        // 1. Snapshot
        let snapshot = match self.store.gift_codes().list_codes().await {
            Ok(codes) => codes,
            Err(e) => return SyncOutcome::Aborted(AbortReason::Storage(e)),
        };

        // 2. Pull
        let listing = match self.remote.fetch_codes().await {
            Ok(listing) => listing,
            Err(RemoteError::Api(message)) => return SyncOutcome::RemoteError(message),
            Err(e) => return SyncOutcome::Aborted(AbortReason::Remote(e)),
        };

        let mut report = SyncReport {
            local_codes: snapshot.len(),
            pulled: listing.lines.len(),
            ..SyncReport::default()
        };

        // 3. Classify
        let mut fresh = Vec::new();
        for line in &listing.lines {
            match parse_line(line) {
                Ok(parsed) => {
                    report.valid += 1;
                    if !snapshot.contains_key(parsed.code.as_str()) {
                        fresh.push(NewCode {
                            code: parsed.code.into_inner(),
                            date: parsed.date.to_iso(),
                        });
                    }
                }
                Err(reason) => {
                    debug!(line = %line, %reason, "Invalid remote line");
                    report.invalid.push(line.trim().to_string());
                }
            }
        }

        // 4. Remote cleanup
        self.delete_invalid(&mut report).await;

        // 5. Local insert
        let new_codes = self.insert_fresh(fresh, &mut report).await;

        // 6. Dispatch
        if !new_codes.is_empty() {
            match self.dispatcher.dispatch(&self.store, &new_codes).await {
                Ok(dispatch) => report.dispatch = Some(dispatch),
                Err(e) => {
                    warn!(error = %e, "Dispatch skipped");
                    report.dispatch_error = Some(e.to_string());
                }
            }
        }

        // 7. Push-back
        self.push_back(&snapshot, &mut report).await;

        SyncOutcome::Success(report)
    }

    async fn delete_invalid(&self, report: &mut SyncReport) {
        for line in &report.invalid {
            let candidate = leading_token(line);
            if candidate.is_empty() {
                debug!("Blank remote line, nothing to delete");
                continue;
            }

            throttle(report.deletes_attempted, self.throttle.delete).await;
            report.deletes_attempted += 1;

            if let Err(e) = self.remote.delete_code(candidate).await {
                warn!(code = candidate, error = %e, "Remote delete of invalid line failed");
                report.deletes_failed += 1;
            }
        }
    }

    async fn insert_fresh(&self, fresh: Vec<NewCode>, report: &mut SyncReport) -> Vec<NewCode> {
        if fresh.is_empty() {
            report.insert_committed = true;
            return Vec::new();
        }

        let rows: Vec<(&str, &str)> =
            fresh.iter().map(|n| (n.code.as_str(), n.date.as_str())).collect();
        let batch = self.store.gift_codes().insert_batch_if_absent(rows).await;

        match batch {
            Ok(batch) => {
                report.inserts_failed = batch.failed;
                report.insert_committed = batch.committed;

                // A repeated code keeps its first date, the one that was stored.
                let mut by_code: BTreeMap<String, NewCode> =
                    fresh.into_iter().rev().map(|n| (n.code.clone(), n)).collect();
                let new_codes: Vec<NewCode> = batch
                    .inserted
                    .iter()
                    .filter_map(|code| by_code.remove(code))
                    .collect();

                report.new_codes = new_codes.iter().map(|n| n.code.clone()).collect();
                new_codes
            }
            Err(e) => {
                warn!(error = %e, "Could not start insert batch");
                report.inserts_failed = fresh.len();
                Vec::new()
            }
        }
    }

    async fn push_back(&self, snapshot: &BTreeMap<String, String>, report: &mut SyncReport) {
        for (index, (code, stored)) in snapshot.iter().enumerate() {
            let date = match IssuedDate::parse_iso(stored) {
                Ok(date) => date,
                Err(e) => {
                    warn!(code = %code, date = %stored, error = %e, "Stored date unreadable, not pushed");
                    report.pushes_failed += 1;
                    continue;
                }
            };

            throttle(index, self.throttle.push).await;

            match self.remote.upsert_code(code, date).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    warn!(code = %code, error = %e, "Push-back failed");
                    report.pushes_failed += 1;
                }
            }
        }
    }
}
