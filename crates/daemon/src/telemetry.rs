//! Logging and error reporting.
//!
//! Sentry (when `SENTRY_DSN` is set) must be initialized before the tracing
//! subscriber so the Sentry layer has a client to report to.

use std::borrow::Cow;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::DaemonConfig;

const DEFAULT_FILTER: &str = "giftsync_daemon=info,tower_http=info";

/// Keeps Sentry flushing until dropped.
#[must_use = "dropping the guard stops error reporting"]
pub struct TelemetryGuard {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Install the Sentry client and the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Output is JSON when
/// `GIFTSYNC_LOG_JSON` is set.
pub fn init(config: &DaemonConfig) -> TelemetryGuard {
    let sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (json, text) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json().flatten_event(true)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_filter))
        .init();

    if sentry.is_some() {
        tracing::info!("Sentry error reporting enabled");
    }

    TelemetryGuard { _sentry: sentry }
}

/// Warnings and errors become Sentry events; info and debug become
/// breadcrumbs on the next event.
fn sentry_filter(metadata: &Metadata<'_>) -> EventFilter {
    let level = *metadata.level();
    if level <= Level::WARN {
        EventFilter::Event
    } else if level <= Level::DEBUG {
        EventFilter::Breadcrumb
    } else {
        EventFilter::Ignore
    }
}
