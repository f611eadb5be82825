//! Gift code repository.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::RepositoryError;

/// Internal row type for `gift_codes` queries.
#[derive(Debug, sqlx::FromRow)]
struct GiftCodeRow {
    giftcode: String,
    date: String,
}

/// Result of a batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsert {
    /// Codes that were not present before the batch, in batch order.
    pub inserted: Vec<String>,
    /// Rows that failed individually and were skipped.
    pub failed: usize,
    /// Whether the batch transaction committed.
    pub committed: bool,
}

/// Repository for gift code database operations.
pub struct GiftCodeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GiftCodeRepository<'a> {
    /// Create a new gift code repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All known codes with their stored (ISO) date.
    ///
    /// Dates are returned as stored; rows imported from a legacy store may
    /// hold dates in other forms.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_codes(&self) -> Result<BTreeMap<String, String>, RepositoryError> {
        let rows: Vec<GiftCodeRow> =
            sqlx::query_as("SELECT giftcode, date FROM gift_codes ORDER BY giftcode")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|r| (r.giftcode, r.date)).collect())
    }

    /// Whether a code is stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, code: &str) -> Result<bool, RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM gift_codes WHERE giftcode = ?")
            .bind(code)
            .fetch_optional(self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Insert a code unless it already exists.
    ///
    /// Returns `true` if a row was written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn insert_code_if_absent(
        &self,
        code: &str,
        date: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("INSERT OR IGNORE INTO gift_codes (giftcode, date) VALUES (?, ?)")
            .bind(code)
            .bind(date)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Insert a batch of `(code, iso_date)` pairs in one transaction.
    ///
    /// A row that fails is logged and skipped. A duplicate (already stored,
    /// or repeated within the batch) is not reported as inserted. If the
    /// commit fails the error is logged and `committed` is `false`; the
    /// inserted list still reflects what the transaction applied, so the
    /// caller can carry on and let the next pass retry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` only if the transaction cannot be
    /// started.
    pub async fn insert_batch_if_absent<I, C, D>(&self, rows: I) -> Result<BatchInsert, RepositoryError>
    where
        I: IntoIterator<Item = (C, D)>,
        C: AsRef<str>,
        D: AsRef<str>,
    {
        let mut tx = self.pool.begin().await?;
        let mut report = BatchInsert::default();

        for (code, date) in rows {
            let code = code.as_ref();
            let result =
                sqlx::query("INSERT OR IGNORE INTO gift_codes (giftcode, date) VALUES (?, ?)")
                    .bind(code)
                    .bind(date.as_ref())
                    .execute(&mut *tx)
                    .await;

            match result {
                Ok(done) if done.rows_affected() == 1 => report.inserted.push(code.to_owned()),
                Ok(_) => debug!(code, "Code already stored"),
                Err(e) => {
                    warn!(code, error = %e, "Failed to insert code, skipping");
                    report.failed += 1;
                }
            }
        }

        match tx.commit().await {
            Ok(()) => report.committed = true,
            Err(e) => warn!(error = %e, "Failed to commit code batch"),
        }

        Ok(report)
    }

    /// Delete a code and every claim that references it, atomically.
    ///
    /// Returns `true` if the code existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back.
    pub async fn delete_code_cascade(&self, code: &str) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claims = sqlx::query("DELETE FROM user_giftcodes WHERE giftcode = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?;

        let codes = sqlx::query("DELETE FROM gift_codes WHERE giftcode = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            code,
            claims_removed = claims.rows_affected(),
            "Deleted code"
        );

        Ok(codes.rows_affected() > 0)
    }

    /// Number of stored codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gift_codes")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
