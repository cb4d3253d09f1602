//! End-to-end runs of the embedded catalog against a temporary SQLite file.

use super::common::{app, post_query_key};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use query_dashboard::catalog::Catalog;
use query_dashboard::config::ConnectionConfig;
use query_dashboard::db::{ConfigConnector, DatabaseBackend};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tempfile::TempDir;

/// Creates a database with a ten-row `Dataset` table and returns its connector.
async fn seeded_database(dir: &TempDir) -> ConfigConnector {
    let path = dir.path().join("dashboard.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();

    sqlx::query(
        "CREATE TABLE Dataset (
            id INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            label TEXT NOT NULL,
            value REAL NOT NULL,
            timestamp TEXT NOT NULL
        )",
    )
    .execute(&mut conn)
    .await
    .unwrap();

    for i in 0..10 {
        let category = if i % 2 == 0 { "alpha" } else { "beta" };
        let label = ["red", "green", "blue"][i % 3];
        sqlx::query("INSERT INTO Dataset (category, label, value, timestamp) VALUES (?, ?, ?, ?)")
            .bind(category)
            .bind(label)
            .bind(1000.0 * i as f64)
            .bind(format!("2025-07-{:02} 12:00:00", 20 + i))
            .execute(&mut conn)
            .await
            .unwrap();
    }
    conn.close().await.unwrap();

    let config = ConnectionConfig::sqlite(path.display().to_string());
    assert_eq!(config.backend, DatabaseBackend::Sqlite);
    ConfigConnector::new(config)
}

#[tokio::test]
async fn test_total_records_over_ten_rows() {
    let dir = tempfile::tempdir().unwrap();
    let connector = seeded_database(&dir).await;

    let response = post_query_key(
        app(Catalog::embedded().unwrap(), connector),
        "/get_output",
        "Sample 1 - Total Records",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({ "columns": ["total_records"], "rows": [[10]] })
    );
}

#[tokio::test]
async fn test_top_labels_query() {
    let dir = tempfile::tempdir().unwrap();
    let connector = seeded_database(&dir).await;

    let response = post_query_key(
        app(Catalog::embedded().unwrap(), connector),
        "/get_output",
        "Sample 8 - Top 3 Frequent Labels",
    )
    .await;

    let body = response.json();
    assert_eq!(body["columns"], json!(["label", "freq"]));
    // red appears at i = 0, 3, 6, 9.
    assert_eq!(body["rows"][0], json!(["red", 4]));
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_database_error_is_reported_in_body() {
    let dir = tempfile::tempdir().unwrap();
    let connector = seeded_database(&dir).await;

    // Users does not exist in this database.
    let response = post_query_key(
        app(Catalog::embedded().unwrap(), connector),
        "/get_output",
        "Sample 4 - All Analysts",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("no such table"), "unexpected error: {message}");
    assert!(body.get("rows").is_none());
}

#[tokio::test]
async fn test_missing_database_file_is_reported_in_body() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let connector = ConfigConnector::new(ConnectionConfig::sqlite(path.display().to_string()));

    let response = post_query_key(
        app(Catalog::embedded().unwrap(), connector),
        "/get_output",
        "Sample 1 - Total Records",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["error"].is_string());
    assert!(!path.exists());
}
