//! Persistent store for gift codes and the rows that hang off them.
//!
//! # Database: `db/app.sqlite`
//!
//! ## Tables
//!
//! - `gift_codes` - Known codes and their ISO issue date
//! - `user_giftcodes` - Per-user claim records (cascade-deleted with the code)
//! - `giftcodecontrol` - Per-group auto-claim opt-in
//! - `admin` - Notification recipients (`is_initial = 1` is primary)
//! - `users` - Users imported from the legacy store
//!
//! # Connection discipline
//!
//! The pool holds exactly one connection. Every caller operation that mutates
//! more than one row runs in its own transaction, and no repository method
//! holds a transaction across an await on another repository.
//!
//! # Ownership
//!
//! A [`Store`] either owns its pool ([`Store::open`]) or borrows one handed in
//! by the host ([`Store::from_pool`]). [`Store::close`] only closes an owned
//! pool.

pub mod admins;
pub mod claims;
pub mod gift_codes;
pub mod groups;
pub mod legacy;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub use admins::AdminRepository;
pub use claims::{ClaimRecord, ClaimRepository};
pub use gift_codes::{BatchInsert, GiftCodeRepository};
pub use groups::GroupRepository;
pub use legacy::{ImportReport, LegacySource};

const SCHEMA: &str = include_str!("../../migrations/0001_gift_codes.sql");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Handle to the unified store.
#[derive(Debug)]
pub struct Store {
    pool: SqlitePool,
    owns_connection: bool,
}

impl Store {
    /// Open (creating if needed) the store at `database_url`.
    ///
    /// The returned store owns its connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the URL is invalid or the
    /// database cannot be opened.
    pub async fn open(database_url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Database(sqlx::Error::Io(e)))?;
        }

        let pool = pool_options().connect_with(options).await?;
        debug!(database_url, "Opened store");

        Ok(Self {
            pool,
            owns_connection: true,
        })
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `SQLite` cannot be initialized.
    pub async fn open_in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = pool_options().connect_with(options).await?;

        Ok(Self {
            pool,
            owns_connection: true,
        })
    }

    /// Wrap a pool owned by someone else.
    ///
    /// The caller must have enabled foreign keys on the pool's connections,
    /// otherwise claim rows are not cascaded by the database. (The store
    /// deletes them explicitly as well.)
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            owns_connection: false,
        }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether [`Store::close`] will close the pool.
    #[must_use]
    pub const fn owns_connection(&self) -> bool {
        self.owns_connection
    }

    /// Close the pool if this store owns it; otherwise leave it to its owner.
    pub async fn close(&self) {
        if self.owns_connection {
            self.pool.close().await;
            debug!("Closed owned store connection");
        } else {
            debug!("Store connection is shared; leaving it open");
        }
    }

    /// Create every table that does not exist yet.
    ///
    /// Never drops or alters existing tables, so it is safe on every start.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        debug!("Schema ensured");
        Ok(())
    }

    /// Import rows from every legacy store found under `legacy_dir`.
    ///
    /// Each source is imported independently with insert-if-absent semantics;
    /// a missing file, missing table or broken source never stops the others.
    /// Safe to run on every start.
    #[instrument(skip(self), fields(legacy_dir = %legacy_dir.display()))]
    pub async fn migrate_legacy_if_present(&self, legacy_dir: &Path) -> Vec<ImportReport> {
        let mut reports = Vec::with_capacity(LegacySource::ALL.len());

        for source in LegacySource::ALL {
            let report = source.try_import(self, legacy_dir).await;
            if report.found {
                info!(
                    source = %source,
                    imported = report.imported,
                    skipped = report.skipped,
                    failed_tables = report.failed_tables.len(),
                    "Legacy store imported"
                );
            }
            reports.push(report);
        }

        reports
    }

    /// Check that the store answers queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Gift code operations.
    #[must_use]
    pub const fn gift_codes(&self) -> GiftCodeRepository<'_> {
        GiftCodeRepository::new(&self.pool)
    }

    /// Group auto-claim flags.
    #[must_use]
    pub const fn groups(&self) -> GroupRepository<'_> {
        GroupRepository::new(&self.pool)
    }

    /// Admin recipients.
    #[must_use]
    pub const fn admins(&self) -> AdminRepository<'_> {
        AdminRepository::new(&self.pool)
    }

    /// Per-user claim records.
    #[must_use]
    pub const fn claims(&self) -> ClaimRepository<'_> {
        ClaimRepository::new(&self.pool)
    }
}

/// One connection, kept for the life of the pool.
///
/// An in-memory database lives and dies with its connection, so idle reaping
/// is disabled.
fn pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .acquire_timeout(Duration::from_secs(30))
}
