//! Per-user claim records (`user_giftcodes`).

use giftsync_core::UserId;
use serde::Serialize;
use sqlx::SqlitePool;

use super::RepositoryError;

/// A user's claim of a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimRecord {
    pub user_id: UserId,
    pub code: String,
    /// `SQLite` `datetime('now')` text, UTC.
    pub created_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    user_id: UserId,
    giftcode: String,
    created_at: String,
}

impl From<ClaimRow> for ClaimRecord {
    fn from(row: ClaimRow) -> Self {
        Self {
            user_id: row.user_id,
            code: row.giftcode,
            created_at: row.created_at,
        }
    }
}

/// Repository for claim records.
pub struct ClaimRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClaimRepository<'a> {
    /// Create a new claim repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record that a user claimed a code.
    ///
    /// Returns `false` if the claim was already recorded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails, including
    /// when the code is not stored.
    pub async fn record_claim(&self, user: &UserId, code: &str) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO user_giftcodes (user_id, giftcode) VALUES (?, ?)")
                .bind(user)
                .bind(code)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Every claim of a code, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn claims_for_code(&self, code: &str) -> Result<Vec<ClaimRecord>, RepositoryError> {
        let rows: Vec<ClaimRow> = sqlx::query_as(
            r"
            SELECT user_id, giftcode, created_at
            FROM user_giftcodes
            WHERE giftcode = ?
            ORDER BY created_at, user_id
            ",
        )
        .bind(code)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of claim rows, across all codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_giftcodes")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
