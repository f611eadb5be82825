//! Auto-claim groups and notification recipients.

use giftsync_core::{AdminId, GroupId};

use super::{CommandError, open_store};

/// Turn auto-claim on or off for a group.
pub async fn group(id: &str, auto_claim: bool) -> Result<(), CommandError> {
    let store = open_store().await?;
    let result = store.groups().set_auto_claim(&GroupId::from(id), auto_claim).await;
    store.close().await;
    result?;

    tracing::info!(group = id, auto_claim, "Group updated");
    Ok(())
}

/// Mark an admin as a primary (notified) admin, or clear the mark.
pub async fn admin(id: &str, primary: bool) -> Result<(), CommandError> {
    let store = open_store().await?;
    let result = store.admins().upsert_admin(&AdminId::from(id), primary).await;
    store.close().await;
    result?;

    tracing::info!(admin = id, primary, "Admin updated");
    Ok(())
}
