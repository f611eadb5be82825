//! Notification recipients (`admin`).

use std::collections::BTreeSet;

use giftsync_core::AdminId;
use sqlx::SqlitePool;

use super::RepositoryError;

/// Repository for admin recipients.
pub struct AdminRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Admins that receive new-code notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_primary_admins(&self) -> Result<BTreeSet<AdminId>, RepositoryError> {
        let ids: Vec<AdminId> = sqlx::query_scalar("SELECT id FROM admin WHERE is_initial = 1")
            .fetch_all(self.pool)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// Add an admin or update its primary flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert_admin(&self, admin: &AdminId, primary: bool) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin (id, is_initial)
            VALUES (?, ?)
            ON CONFLICT (id) DO UPDATE SET is_initial = excluded.is_initial
            ",
        )
        .bind(admin)
        .bind(i64::from(primary))
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
    async fn test_primary_admins() {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();
        let admins = store.admins();

        admins.upsert_admin(&AdminId::from("U1"), true).await.unwrap();
        admins.upsert_admin(&AdminId::from("U2"), false).await.unwrap();

        let primary = admins.list_primary_admins().await.unwrap();
        assert!(primary.contains(&AdminId::from("U1")));
        assert!(!primary.contains(&AdminId::from("U2")));
    }
}
