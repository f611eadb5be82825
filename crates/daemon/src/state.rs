//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::services::LastPass;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<Store>,
    last_pass: LastPass,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create the state.
    #[must_use]
    pub fn new(store: Arc<Store>, last_pass: LastPass) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                last_pass,
                started_at: Utc::now(),
            }),
        }
    }

    /// The unified store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Latest sync pass.
    #[must_use]
    pub fn last_pass(&self) -> &LastPass {
        &self.inner.last_pass
    }

    /// When the daemon started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }
}
