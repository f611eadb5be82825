//! One-time import from the pre-merge stores.
//!
//! Earlier deployments kept codes, settings and users in three separate
//! `SQLite` files. Each file is an independent [`LegacySource`]: it is opened
//! read-only, every table is copied with `INSERT OR IGNORE`, and nothing that
//! goes wrong inside one source reaches the caller or the other sources.
//!
//! IDs that were stored as integers are imported as text; NULL flags become 0.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, warn};

use super::{RepositoryError, Store};

/// A pre-merge store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacySource {
    /// `giftcode.sqlite`: codes, claims and group flags.
    GiftCodes,
    /// `settings.sqlite`: admins.
    Settings,
    /// `users.sqlite`: users.
    Users,
}

/// What one source import did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub source: LegacySource,
    /// Whether the file exists.
    pub found: bool,
    /// Rows written to the unified store.
    pub imported: u64,
    /// Rows already present, or rejected by a constraint.
    pub skipped: u64,
    /// Tables that exist but could not be imported.
    pub failed_tables: Vec<String>,
    /// Set when the file could not be opened at all.
    pub error: Option<String>,
}

impl ImportReport {
    const fn new(source: LegacySource) -> Self {
        Self {
            source,
            found: false,
            imported: 0,
            skipped: 0,
            failed_tables: Vec::new(),
            error: None,
        }
    }
}

/// How to copy one legacy table.
///
/// Every table is read as a `(key, value)` text pair so a single insert path
/// covers them all.
struct TableImport {
    table: &'static str,
    select: &'static str,
    insert: &'static str,
}

const GIFT_CODES: TableImport = TableImport {
    table: "gift_codes",
    select: "SELECT CAST(giftcode AS TEXT), CAST(date AS TEXT) FROM gift_codes",
    insert: "INSERT OR IGNORE INTO gift_codes (giftcode, date) VALUES (?, ?)",
};

// After GIFT_CODES: claims on codes that did not make it are rejected by the
// foreign key.
const USER_CLAIMS: TableImport = TableImport {
    table: "user_giftcodes",
    select: "SELECT CAST(user_id AS TEXT), CAST(giftcode AS TEXT) FROM user_giftcodes",
    insert: "INSERT OR IGNORE INTO user_giftcodes (user_id, giftcode) VALUES (?, ?)",
};

const GROUP_FLAGS: TableImport = TableImport {
    table: "giftcodecontrol",
    select: "SELECT CAST(alliance_id AS TEXT), CAST(CAST(COALESCE(status, 0) AS INTEGER) AS TEXT) \
             FROM giftcodecontrol",
    insert: "INSERT OR IGNORE INTO giftcodecontrol (alliance_id, status) \
             VALUES (?, CAST(? AS INTEGER))",
};

const ADMINS: TableImport = TableImport {
    table: "admin",
    select: "SELECT CAST(id AS TEXT), CAST(CAST(COALESCE(is_initial, 0) AS INTEGER) AS TEXT) \
             FROM admin",
    insert: "INSERT OR IGNORE INTO admin (id, is_initial) VALUES (?, CAST(? AS INTEGER))",
};

const USERS_WITH_NAME: TableImport = TableImport {
    table: "users",
    select: "SELECT CAST(id AS TEXT), CAST(name AS TEXT) FROM users",
    insert: "INSERT OR IGNORE INTO users (id, name) VALUES (?, ?)",
};

const USERS_ID_ONLY: TableImport = TableImport {
    table: "users",
    select: "SELECT CAST(id AS TEXT), NULL FROM users",
    insert: "INSERT OR IGNORE INTO users (id, name) VALUES (?, ?)",
};

impl LegacySource {
    /// Every source, in import order.
    pub const ALL: [Self; 3] = [Self::GiftCodes, Self::Settings, Self::Users];

    /// File name inside the legacy directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::GiftCodes => "giftcode.sqlite",
            Self::Settings => "settings.sqlite",
            Self::Users => "users.sqlite",
        }
    }

    /// Import this source into `store` if its file exists under `legacy_dir`.
    ///
    /// Never fails: problems are logged and recorded in the report.
    pub async fn try_import(self, store: &Store, legacy_dir: &Path) -> ImportReport {
        let mut report = ImportReport::new(self);
        let path = legacy_dir.join(self.file_name());

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(source = %self, path = %path.display(), "Legacy store not present");
            return report;
        }
        report.found = true;

        let options = SqliteConnectOptions::new().filename(&path).read_only(true);
        let mut legacy = match SqliteConnection::connect_with(&options).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(source = %self, error = %e, "Failed to open legacy store");
                report.error = Some(e.to_string());
                return report;
            }
        };

        for table in self.tables(&mut legacy).await {
            match import_table(&mut legacy, store, table).await {
                Ok(Some((imported, skipped))) => {
                    report.imported += imported;
                    report.skipped += skipped;
                }
                Ok(None) => debug!(source = %self, table = table.table, "Legacy table absent"),
                Err(e) => {
                    warn!(source = %self, table = table.table, error = %e, "Legacy table import failed");
                    report.failed_tables.push(table.table.to_string());
                }
            }
        }

        if let Err(e) = legacy.close().await {
            debug!(source = %self, error = %e, "Error closing legacy store");
        }

        report
    }

    async fn tables(self, legacy: &mut SqliteConnection) -> Vec<&'static TableImport> {
        match self {
            Self::GiftCodes => vec![&GIFT_CODES, &USER_CLAIMS, &GROUP_FLAGS],
            Self::Settings => vec![&ADMINS],
            Self::Users => {
                let has_name: Result<i64, sqlx::Error> = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM pragma_table_info('users') WHERE name = 'name'",
                )
                .fetch_one(&mut *legacy)
                .await;

                if matches!(has_name, Ok(n) if n > 0) {
                    vec![&USERS_WITH_NAME]
                } else {
                    vec![&USERS_ID_ONLY]
                }
            }
        }
    }
}

impl fmt::Display for LegacySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Copy one table. Returns `None` if the legacy store does not have it.
async fn import_table(
    legacy: &mut SqliteConnection,
    store: &Store,
    table: &TableImport,
) -> Result<Option<(u64, u64)>, RepositoryError> {
    let present: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table.table)
            .fetch_one(&mut *legacy)
            .await?;
    if present == 0 {
        return Ok(None);
    }

    let rows: Vec<(Option<String>, Option<String>)> =
        sqlx::query_as(table.select).fetch_all(&mut *legacy).await?;

    let mut tx = store.pool().begin().await?;
    let mut imported = 0;
    let mut skipped = 0;

    for (key, value) in rows {
        let Some(key) = key else {
            skipped += 1;
            continue;
        };

        match sqlx::query(table.insert)
            .bind(&key)
            .bind(value)
            .execute(&mut *tx)
            .await
        {
            Ok(done) if done.rows_affected() == 1 => imported += 1,
            Ok(_) => skipped += 1,
            Err(e) => {
                debug!(table = table.table, key, error = %e, "Legacy row rejected");
                skipped += 1;
            }
        }
    }

    tx.commit().await?;

    Ok(Some((imported, skipped)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use giftsync_core::{AdminId, GroupId};

    use super::*;

    async fn seed(path: &Path, sql: &str) {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        sqlx::raw_sql(sql).execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();
    }

    async fn store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_no_legacy_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store().await;

        let reports = store.migrate_legacy_if_present(dir.path()).await;

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| !r.found && r.imported == 0));
    }

    #[tokio::test]
    async fn test_giftcode_store_import_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            &dir.path().join("giftcode.sqlite"),
            r"
            CREATE TABLE gift_codes (giftcode TEXT PRIMARY KEY, date TEXT);
            INSERT INTO gift_codes VALUES ('ABC123', '2024-06-01'), ('OLD1', '2023-01-01');
            CREATE TABLE user_giftcodes (user_id INTEGER, giftcode TEXT);
            INSERT INTO user_giftcodes VALUES (42, 'ABC123'), (43, 'GHOST');
            CREATE TABLE giftcodecontrol (alliance_id INTEGER, status INTEGER);
            INSERT INTO giftcodecontrol VALUES (100, 1), (200, NULL);
            ",
        )
        .await;
        let store = store().await;
        store
            .gift_codes()
            .insert_code_if_absent("ABC123", "2024-06-02")
            .await
            .unwrap();

        let first = LegacySource::GiftCodes.try_import(&store, dir.path()).await;
        assert!(first.found);
        assert!(first.failed_tables.is_empty());
        // OLD1, the claim by 42, both groups
        assert_eq!(first.imported, 4);
        // ABC123 already present, claim on GHOST violates the foreign key
        assert_eq!(first.skipped, 2);

        let codes = store.gift_codes().list_codes().await.unwrap();
        assert_eq!(codes.get("ABC123").map(String::as_str), Some("2024-06-02"));
        assert_eq!(
            store.groups().list_auto_claim_groups().await.unwrap().into_iter().collect::<Vec<_>>(),
            vec![GroupId::from("100")]
        );

        let second = LegacySource::GiftCodes.try_import(&store, dir.path()).await;
        assert_eq!(second.imported, 0);
    }

    #[tokio::test]
    async fn test_missing_table_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            &dir.path().join("settings.sqlite"),
            "CREATE TABLE unrelated (x INTEGER);",
        )
        .await;
        seed(
            &dir.path().join("users.sqlite"),
            "CREATE TABLE users (id INTEGER PRIMARY KEY); INSERT INTO users VALUES (7), (8);",
        )
        .await;
        let store = store().await;

        let reports = store.migrate_legacy_if_present(dir.path()).await;

        let settings = reports
            .iter()
            .find(|r| r.source == LegacySource::Settings)
            .unwrap();
        assert!(settings.found);
        assert!(settings.failed_tables.is_empty());
        assert_eq!(settings.imported, 0);

        let users = reports
            .iter()
            .find(|r| r.source == LegacySource::Users)
            .unwrap();
        assert_eq!(users.imported, 2);
    }

    #[tokio::test]
    async fn test_admin_flags_import_as_integers() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            &dir.path().join("settings.sqlite"),
            r"
            CREATE TABLE admin (id INTEGER PRIMARY KEY, is_initial INTEGER);
            INSERT INTO admin VALUES (111, 1), (222, 0), (333, NULL);
            ",
        )
        .await;
        let store = store().await;

        let report = LegacySource::Settings.try_import(&store, dir.path()).await;

        assert_eq!(report.imported, 3);
        let primary = store.admins().list_primary_admins().await.unwrap();
        assert_eq!(primary.into_iter().collect::<Vec<_>>(), vec![AdminId::from("111")]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("users.sqlite"), b"definitely not sqlite")
            .await
            .unwrap();
        let store = store().await;

        let report = LegacySource::Users.try_import(&store, dir.path()).await;

        assert!(report.found);
        assert_eq!(report.imported, 0);
        assert!(report.error.is_some() || !report.failed_tables.is_empty());
    }
}
