//! Importing pre-merge stores and syncing on top of them.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use giftsync_daemon::db::Store;
use giftsync_integration_tests::{API_PATH, TestContext};
use httpmock::prelude::*;
use serde_json::json;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

async fn write_legacy(path: &Path, sql: &str) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    sqlx::raw_sql(sql).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_imported_settings_drive_first_pass() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_dir = dir.path().join("legacy");
    std::fs::create_dir_all(&legacy_dir).unwrap();

    write_legacy(
        &legacy_dir.join("giftcode.sqlite"),
        r"
        CREATE TABLE gift_codes (giftcode TEXT PRIMARY KEY, date TEXT);
        INSERT INTO gift_codes VALUES ('OLD1', '2024-01-01');
        CREATE TABLE user_giftcodes (user_id INTEGER, giftcode TEXT);
        INSERT INTO user_giftcodes VALUES (7, 'OLD1');
        CREATE TABLE giftcodecontrol (alliance_id INTEGER, status INTEGER);
        INSERT INTO giftcodecontrol VALUES (100, 1), (200, 0);
        ",
    )
    .await;
    write_legacy(
        &legacy_dir.join("settings.sqlite"),
        r"
        CREATE TABLE admin (id INTEGER PRIMARY KEY, is_initial INTEGER);
        INSERT INTO admin VALUES (42, 1), (43, 0);
        ",
    )
    .await;

    let url = format!("sqlite://{}", dir.path().join("app.sqlite").display());
    let store = Store::open(&url).await.unwrap();
    store.ensure_schema().await.unwrap();
    let reports = store.migrate_legacy_if_present(&legacy_dir).await;

    assert!(reports[0].found && reports[0].error.is_none());
    assert!(reports[1].found);
    assert!(!reports[2].found);
    assert_eq!(store.claims().count().await.unwrap(), 1);

    let ctx = TestContext::builder().store(store).build().await;

    ctx.server
        .mock_async(|when, then| {
            when.method(GET).path(API_PATH);
            then.status(200)
                .json_body(json!({"codes": ["OLD1 01.01.2024", "NEW1 15.07.2024"]}));
        })
        .await;
    let push_old = ctx
        .server
        .mock_async(|when, then| {
            when.method(POST)
                .path(API_PATH)
                .json_body(json!({"code": "OLD1", "date": "01.01.2024"}));
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let outcome = ctx.services.engine.sync_once().await;
    let report = outcome.report().unwrap();

    push_old.assert_async().await;
    assert_eq!(report.new_codes, vec!["NEW1"]);
    assert_eq!(
        ctx.notifier.deliveries(),
        vec![("42".to_string(), "NEW1".to_string())]
    );
    assert_eq!(
        ctx.redeemer.as_ref().unwrap().redemptions(),
        vec![("100".to_string(), "NEW1".to_string())]
    );

    ctx.store().close().await;
}

#[tokio::test]
async fn test_second_import_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_legacy(
        &dir.path().join("giftcode.sqlite"),
        r"
        CREATE TABLE gift_codes (giftcode TEXT PRIMARY KEY, date TEXT);
        INSERT INTO gift_codes VALUES ('A1', '2024-01-01'), ('B2', '2024-01-02');
        ",
    )
    .await;

    let store = Store::open_in_memory().await.unwrap();
    store.ensure_schema().await.unwrap();

    let first = store.migrate_legacy_if_present(dir.path()).await;
    let second = store.migrate_legacy_if_present(dir.path()).await;

    assert_eq!(first[0].imported, 2);
    assert_eq!(second[0].imported, 0);
    assert_eq!(second[0].skipped, 2);
    assert_eq!(store.gift_codes().count().await.unwrap(), 2);
}
