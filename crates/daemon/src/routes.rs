//! HTTP routes.
//!
//! # Routes
//!
//! ```text
//! GET  /health        - Liveness
//! GET  /health/ready  - Store reachable
//! GET  /status        - Latest sync pass (JSON)
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::DaemonError;
use crate::services::PassRecord;
use crate::state::AppState;

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub started_at: DateTime<Utc>,
    pub stored_codes: i64,
    pub last_pass: Option<PassRecord>,
}

/// Build the router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/status", get(status))
}

/// The routes with request tracing and Sentry hubs attached.
pub fn app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    routes()
        .layer(trace)
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, DaemonError> {
    let stored_codes = state.store().gift_codes().count().await?;
    let last_pass = state.last_pass().read().await.clone();

    Ok(Json(StatusResponse {
        started_at: state.started_at(),
        stored_codes,
        last_pass,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use super::*;
    use crate::db::Store;

    async fn app() -> Router {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();
        let state = AppState::new(Arc::new(store), Arc::new(RwLock::new(None)));
        super::app(state)
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = app().await;

        let live = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(live.status(), StatusCode::OK);

        let ready = app
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_before_first_pass() {
        let response = app()
            .await
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["stored_codes"], 0);
        assert!(body["last_pass"].is_null());
    }
}
