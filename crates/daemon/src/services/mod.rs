//! Reconciliation services.
//!
//! # Services
//!
//! - `reconcile` - One sync pass against the remote API ([`SyncEngine`])
//! - `dispatch` - New-code notifications and auto-claim ([`Dispatcher`])
//! - `lifecycle` - On-demand add/remove/check/clean ([`CodeLifecycle`])
//! - `scheduler` - Periodic driver for the sync pass ([`Scheduler`])

pub mod dispatch;
pub mod lifecycle;
pub mod reconcile;
pub mod scheduler;

use std::time::Duration;

pub use dispatch::{DispatchReport, Dispatcher, NewCode};
pub use lifecycle::{CleanReport, CodeLifecycle, LifecycleError, RemovalGuard};
pub use reconcile::{AbortReason, SyncEngine, SyncOutcome, SyncReport};
pub use scheduler::{LastPass, PassRecord, Scheduler};

/// Sleep between successive calls of a loop that hits an external system.
///
/// Does nothing before the first call or when the delay is zero.
pub(crate) async fn throttle(index: usize, delay: Duration) {
    if index > 0 && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
