//! End-to-end tests for giftsync.
//!
//! Every test runs against an in-memory (or temporary) store and an
//! [`httpmock`] server standing in for the remote gift code API, so nothing
//! external is needed.
//!
//! ```bash
//! cargo test -p giftsync-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `reconcile` - full sync passes
//! - `lifecycle` - add/remove/check/clean
//! - `legacy` - importing pre-merge stores
//! - `scheduler` - the periodic driver

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use giftsync_core::{AdminId, GroupId, RedeemOutcome};
use giftsync_daemon::Services;
use giftsync_daemon::config::{RemoteApiConfig, ThrottleConfig};
use giftsync_daemon::db::Store;
use giftsync_daemon::notify::{NewCodeNotice, Notifier, NotifyError};
use giftsync_daemon::redeem::{RedeemError, Redeemer};
use giftsync_daemon::remote::RemoteClient;
use httpmock::MockServer;
use secrecy::SecretString;
use url::Url;

/// Path of the mocked remote endpoint.
pub const API_PATH: &str = "/giftcode_api.php";

/// API key every mocked request must carry.
pub const API_KEY: &str = "integration-key-5c1e";

/// Notifier that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(AdminId, NewCodeNotice)>>,
    unreachable: BTreeSet<AdminId>,
}

impl RecordingNotifier {
    /// A notifier for which `admins` cannot be reached.
    #[must_use]
    pub fn with_unreachable<I, A>(admins: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AdminId>,
    {
        Self {
            sent: Mutex::default(),
            unreachable: admins.into_iter().map(Into::into).collect(),
        }
    }

    /// `(recipient, code)` for every successful delivery, in order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(admin, notice)| (admin.to_string(), notice.code.clone()))
            .collect()
    }

    /// The notices delivered, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<NewCodeNotice> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, notice)| notice.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &AdminId, notice: &NewCodeNotice) -> Result<(), NotifyError> {
        if self.unreachable.contains(recipient) {
            return Err(NotifyError::RecipientUnreachable {
                recipient: recipient.to_string(),
                reason: "user_not_found".to_string(),
            });
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((recipient.clone(), notice.clone()));
        Ok(())
    }
}

/// Redeemer answering from a fixed table; unlisted codes are `OK`.
#[derive(Debug, Default)]
pub struct ScriptedRedeemer {
    outcomes: BTreeMap<String, RedeemOutcome>,
    redeemed: Mutex<Vec<(GroupId, String)>>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedRedeemer {
    /// A redeemer answering `outcome` for each listed code.
    #[must_use]
    pub fn with_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, RedeemOutcome)>,
    {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|(code, outcome)| (code.to_string(), outcome))
                .collect(),
            ..Self::default()
        }
    }

    fn outcome_for(&self, code: &str) -> RedeemOutcome {
        self.outcomes.get(code).copied().unwrap_or(RedeemOutcome::Ok)
    }

    /// `(group, code)` for every redemption, in order.
    #[must_use]
    pub fn redemptions(&self) -> Vec<(String, String)> {
        self.redeemed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(group, code)| (group.to_string(), code.clone()))
            .collect()
    }

    /// Codes probed, in order.
    #[must_use]
    pub fn probes(&self) -> Vec<String> {
        self.probed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Redeemer for ScriptedRedeemer {
    async fn redeem(&self, group: &GroupId, code: &str) -> Result<RedeemOutcome, RedeemError> {
        self.redeemed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((group.clone(), code.to_string()));
        Ok(self.outcome_for(code))
    }

    async fn probe(&self, code: &str) -> Result<RedeemOutcome, RedeemError> {
        self.probed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code.to_string());
        Ok(self.outcome_for(code))
    }
}

/// A mocked remote, a prepared store and services wired to both.
pub struct TestContext {
    pub server: MockServer,
    pub services: Services,
    pub notifier: Arc<RecordingNotifier>,
    pub redeemer: Option<Arc<ScriptedRedeemer>>,
}

impl TestContext {
    /// In-memory store, recording notifier, and a redeemer answering `OK`.
    ///
    /// # Panics
    ///
    /// Panics if the store or the remote client cannot be set up.
    pub async fn new() -> Self {
        Self::builder().build().await
    }

    /// Start configuring a context.
    #[must_use]
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder::default()
    }

    /// Shorthand for the store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.services.store
    }

    /// Store a code directly, bypassing the remote.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn seed_code(&self, code: &str, iso_date: &str) {
        self.store()
            .gift_codes()
            .insert_code_if_absent(code, iso_date)
            .await
            .expect("seed code");
    }

    /// Current store contents as `code -> ISO date`.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be read.
    pub async fn stored_codes(&self) -> BTreeMap<String, String> {
        self.store()
            .gift_codes()
            .list_codes()
            .await
            .expect("list codes")
    }
}

/// Builder for [`TestContext`].
#[derive(Default)]
pub struct TestContextBuilder {
    store: Option<Store>,
    notifier: Option<RecordingNotifier>,
    redeemer: Option<Option<ScriptedRedeemer>>,
    throttle: Option<ThrottleConfig>,
}

impl TestContextBuilder {
    /// Use an already opened store instead of a fresh in-memory one.
    #[must_use]
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this notifier.
    #[must_use]
    pub fn notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use this redeemer.
    #[must_use]
    pub fn redeemer(mut self, redeemer: ScriptedRedeemer) -> Self {
        self.redeemer = Some(Some(redeemer));
        self
    }

    /// Run without a redemption collaborator.
    #[must_use]
    pub fn without_redeemer(mut self) -> Self {
        self.redeemer = Some(None);
        self
    }

    /// Use these inter-call delays instead of none.
    #[must_use]
    pub const fn throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Start the mock server and wire everything up.
    ///
    /// # Panics
    ///
    /// Panics if the store or the remote client cannot be set up.
    pub async fn build(self) -> TestContext {
        let server = MockServer::start_async().await;

        let store = match self.store {
            Some(store) => store,
            None => Store::open_in_memory().await.expect("in-memory store"),
        };
        store.ensure_schema().await.expect("schema");

        let remote = RemoteClient::new(&RemoteApiConfig {
            endpoint: Url::parse(&server.url(API_PATH)).expect("mock url"),
            api_key: SecretString::from(API_KEY),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(5),
        })
        .expect("remote client");

        let notifier = Arc::new(self.notifier.unwrap_or_default());
        let redeemer = self
            .redeemer
            .unwrap_or_else(|| Some(ScriptedRedeemer::default()))
            .map(Arc::new);

        let services = Services::assemble(
            Arc::new(store),
            remote,
            Some(Arc::clone(&notifier) as Arc<dyn Notifier>),
            redeemer.clone().map(|r| r as Arc<dyn Redeemer>),
            self.throttle.unwrap_or_else(ThrottleConfig::none),
        );

        TestContext {
            server,
            services,
            notifier,
            redeemer,
        }
    }
}
