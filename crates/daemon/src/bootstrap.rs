//! Wiring services from configuration.

use std::sync::Arc;

use tracing::info;

use crate::config::{DaemonConfig, ThrottleConfig};
use crate::db::{ImportReport, Store};
use crate::error::DaemonError;
use crate::notify::{Notifier, SlackNotifier};
use crate::redeem::{HttpRedeemer, Redeemer};
use crate::remote::RemoteClient;
use crate::services::{CodeLifecycle, Dispatcher, SyncEngine};

/// Everything the daemon and the CLI run on.
#[derive(Debug)]
pub struct Services {
    pub store: Arc<Store>,
    pub engine: SyncEngine,
    pub lifecycle: CodeLifecycle,
}

impl Services {
    /// Open the configured store, prepare it, and build every service.
    ///
    /// Runs `ensure_schema` then the legacy import; the import reports are
    /// returned alongside.
    ///
    /// # Errors
    ///
    /// Returns `DaemonError` if the store cannot be opened or prepared, or an
    /// HTTP client cannot be built.
    pub async fn from_config(
        config: &DaemonConfig,
    ) -> Result<(Self, Vec<ImportReport>), DaemonError> {
        let store = Store::open(&config.database_url).await?;
        store.ensure_schema().await?;
        let reports = store.migrate_legacy_if_present(&config.legacy_dir).await;

        let remote = RemoteClient::new(&config.remote)?;

        let notifier = match &config.slack {
            Some(slack) => {
                info!("Slack notifications enabled");
                Some(Arc::new(SlackNotifier::from_config(slack)?) as Arc<dyn Notifier>)
            }
            None => None,
        };
        let redeemer = match &config.redeem {
            Some(redeem) => {
                info!(base_url = %redeem.base_url, timeout = ?redeem.timeout, "Redemption service enabled");
                Some(Arc::new(HttpRedeemer::new(redeem)?) as Arc<dyn Redeemer>)
            }
            None => None,
        };

        let services = Self::assemble(Arc::new(store), remote, notifier, redeemer, config.throttle);
        Ok((services, reports))
    }

    /// Build services around an already prepared store and explicit
    /// collaborators.
    #[must_use]
    pub fn assemble(
        store: Arc<Store>,
        remote: RemoteClient,
        notifier: Option<Arc<dyn Notifier>>,
        redeemer: Option<Arc<dyn Redeemer>>,
        throttle: ThrottleConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(notifier, redeemer.clone(), throttle.redeem);
        let engine = SyncEngine::new(remote.clone(), Arc::clone(&store), dispatcher, throttle);
        let lifecycle = CodeLifecycle::new(remote, Arc::clone(&store), redeemer, throttle.validate);

        Self {
            store,
            engine,
            lifecycle,
        }
    }
}
