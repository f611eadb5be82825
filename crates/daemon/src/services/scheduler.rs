//! Periodic driver for [`SyncEngine::sync_once`].
//!
//! Waits for the initial delay, runs a pass, then runs one pass per interval
//! until shutdown. A pass is awaited inline, so passes never overlap; a slow
//! pass pushes the next tick back rather than queueing a burst.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument};

use super::reconcile::{SyncEngine, SyncOutcome, SyncReport};
use crate::config::ScheduleConfig;

/// Summary of the latest pass, exposed on `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct PassRecord {
    /// 1-based pass counter since start.
    pub pass: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `success`, `remote_error` or `aborted`.
    pub outcome: &'static str,
    pub retryable: bool,
    /// Error text for non-success outcomes.
    pub detail: Option<String>,
    pub report: Option<SyncReport>,
}

impl PassRecord {
    fn new(pass: u64, started_at: DateTime<Utc>, outcome: &SyncOutcome) -> Self {
        let detail = match outcome {
            SyncOutcome::Success(_) => None,
            SyncOutcome::RemoteError(message) => Some(message.clone()),
            SyncOutcome::Aborted(reason) => Some(reason.to_string()),
        };

        Self {
            pass,
            started_at,
            finished_at: Utc::now(),
            outcome: outcome.label(),
            retryable: outcome.is_retryable(),
            detail,
            report: outcome.report().cloned(),
        }
    }
}

/// Shared slot holding the latest [`PassRecord`].
pub type LastPass = Arc<RwLock<Option<PassRecord>>>;

/// Runs sync passes on a fixed schedule.
#[derive(Debug)]
pub struct Scheduler {
    engine: SyncEngine,
    schedule: ScheduleConfig,
    last_pass: LastPass,
}

impl Scheduler {
    /// Create a scheduler that records passes in `last_pass`.
    #[must_use]
    pub const fn new(engine: SyncEngine, schedule: ScheduleConfig, last_pass: LastPass) -> Self {
        Self {
            engine,
            schedule,
            last_pass,
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// A pass in flight is finished before shutdown is observed.
    #[instrument(skip_all, fields(interval_secs = self.schedule.interval.as_secs()))]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            initial_delay_secs = self.schedule.initial_delay.as_secs(),
            "Scheduler started"
        );

        tokio::select! {
            () = tokio::time::sleep(self.schedule.initial_delay) => {}
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Scheduler stopped before first pass");
                return;
            }
        }

        let mut ticker = tokio::time::interval(self.schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pass = 0_u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    pass += 1;
                    let started_at = Utc::now();
                    let outcome = self.engine.sync_once().await;
                    *self.last_pass.write().await = Some(PassRecord::new(pass, started_at, &outcome));
                }
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!(passes = pass, "Scheduler stopped");
    }
}

/// Resolves once shutdown is requested.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender also means shutdown.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
