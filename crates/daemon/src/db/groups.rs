//! Group auto-claim flags (`giftcodecontrol`).

use std::collections::BTreeSet;

use giftsync_core::GroupId;
use sqlx::SqlitePool;

use super::RepositoryError;

/// Repository for group auto-claim flags.
pub struct GroupRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Groups that opted in to automatic redemption.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_auto_claim_groups(&self) -> Result<BTreeSet<GroupId>, RepositoryError> {
        let ids: Vec<GroupId> =
            sqlx::query_scalar("SELECT alliance_id FROM giftcodecontrol WHERE status = 1")
                .fetch_all(self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }

    /// Set a group's auto-claim flag, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn set_auto_claim(&self, group: &GroupId, enabled: bool) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO giftcodecontrol (alliance_id, status)
            VALUES (?, ?)
            ON CONFLICT (alliance_id) DO UPDATE SET status = excluded.status
            ",
        )
        .bind(group)
        .bind(i64::from(enabled))
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::Store;
    use super::*;

    #[tokio::test]
    async fn test_only_enabled_groups_are_listed() {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();
        let groups = store.groups();

        groups.set_auto_claim(&GroupId::from("100"), true).await.unwrap();
        groups.set_auto_claim(&GroupId::from("200"), true).await.unwrap();
        groups.set_auto_claim(&GroupId::from("300"), false).await.unwrap();
        groups.set_auto_claim(&GroupId::from("200"), false).await.unwrap();

        let enabled = groups.list_auto_claim_groups().await.unwrap();
        assert_eq!(enabled.into_iter().collect::<Vec<_>>(), vec![GroupId::from("100")]);
    }

    #[tokio::test]
    async fn test_group_id_is_stored_as_plain_text() {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();

        sqlx::query("INSERT INTO giftcodecontrol (alliance_id, status) VALUES ('4242', 1)")
            .execute(store.pool())
            .await
            .unwrap();
        store
            .groups()
            .set_auto_claim(&GroupId::from("100"), true)
            .await
            .unwrap();

        let raw: String =
            sqlx::query_scalar("SELECT alliance_id FROM giftcodecontrol WHERE alliance_id = ?")
                .bind(GroupId::from("100"))
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(raw, "100");

        let enabled = store.groups().list_auto_claim_groups().await.unwrap();
        assert!(enabled.contains(&GroupId::from("4242")));
    }
}
