//! Gift code commands.
//!
//! # Usage
//!
//! ```bash
//! giftsync codes list
//! giftsync codes add ABC123
//! giftsync codes check ABC123
//! giftsync codes remove ABC123 --validated
//! giftsync codes clean
//! giftsync codes claims ABC123
//! giftsync codes claim ABC123 --user 42
//! ```

use giftsync_core::UserId;
use giftsync_daemon::services::RemovalGuard;
use serde::Serialize;

use super::{CommandError, open_store, print_json, services};

#[derive(Serialize)]
struct StoredCode<'a> {
    code: &'a str,
    date: &'a str,
}

#[derive(Serialize)]
struct CheckResult<'a> {
    code: &'a str,
    exists: bool,
}

/// Print every stored code with its issue date.
pub async fn list() -> Result<(), CommandError> {
    let store = open_store().await?;
    let codes = store.gift_codes().list_codes().await?;
    store.close().await;

    let rows: Vec<StoredCode<'_>> = codes
        .iter()
        .map(|(code, date)| StoredCode { code, date })
        .collect();
    print_json(&rows)
}

/// Add a code remotely and locally.
pub async fn add(code: &str) -> Result<(), CommandError> {
    let services = services().await?;
    let result = services.lifecycle.add_code(code).await;
    services.store.close().await;

    let added = result?;
    tracing::info!(code = %added, "Code added");
    Ok(())
}

/// Report whether the remote knows a code.
pub async fn check(code: &str) -> Result<(), CommandError> {
    let services = services().await?;
    let exists = services.lifecycle.check_code(code).await;
    services.store.close().await;

    print_json(&CheckResult { code, exists })
}

/// Remove a code; refused unless `validated` is set.
pub async fn remove(code: &str, validated: bool) -> Result<(), CommandError> {
    let guard = if validated {
        RemovalGuard::Validated
    } else {
        RemovalGuard::Unconfirmed
    };

    let services = services().await?;
    let result = services.lifecycle.remove_code(code, guard).await;
    services.store.close().await;

    let existed = result?;
    if !existed {
        tracing::warn!(code, "Code was not stored locally; removed remotely only");
    }
    Ok(())
}

/// Probe every stored code and remove the dead ones.
pub async fn clean() -> Result<(), CommandError> {
    let services = services().await?;
    let result = services.lifecycle.validate_and_clean_all().await;
    services.store.close().await;

    print_json(&result?)
}

/// Print the claims recorded for a code.
pub async fn claims(code: &str) -> Result<(), CommandError> {
    let store = open_store().await?;
    let claims = store.claims().claims_for_code(code).await;
    store.close().await;

    print_json(&claims?)
}

/// Record a user's claim of a stored code.
pub async fn claim(code: &str, user: &str) -> Result<(), CommandError> {
    let store = open_store().await?;
    let recorded = store.claims().record_claim(&UserId::from(user), code).await;
    store.close().await;

    if !recorded? {
        tracing::info!(code, user, "Claim already recorded");
    }
    Ok(())
}
