//! HTTP handler tests against the mock connector.

use super::common::{app, get, post_query_key, send};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use query_dashboard::catalog::Catalog;
use query_dashboard::db::{ColumnInfo, MockConnector, QueryResult, Value};
use serde_json::json;
use std::time::Duration;

const TOTAL_RECORDS_SQL: &str = "SELECT COUNT(*) AS total_records FROM Dataset;";

fn test_catalog() -> Catalog {
    Catalog::from_toml(
        r#"
[[query]]
label = "Total"
sql = "SELECT COUNT(*) AS total_records FROM Dataset;"

[[query]]
label = "Broken"
sql = "SELEC * FRM Dataset;"

[[query]]
label = "Categories"
sql = "SELECT category FROM Dataset;"

[[query]]
label = "Labels"
sql = "SELECT label FROM Dataset;"
"#,
    )
    .unwrap()
}

fn single_column(name: &str, values: &[&str]) -> QueryResult {
    QueryResult::with_data(
        vec![ColumnInfo::new(name, "text")],
        values.iter().map(|v| vec![Value::from(*v)]).collect(),
    )
}

fn total_records(count: i64) -> QueryResult {
    QueryResult::with_data(
        vec![ColumnInfo::new("total_records", "int8")],
        vec![vec![Value::Int(count)]],
    )
}

#[tokio::test]
async fn test_index_lists_every_label() {
    let catalog = Catalog::embedded().unwrap();
    let labels: Vec<String> = catalog.labels().map(String::from).collect();

    let response = get(app(catalog, MockConnector::new()), "/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type.starts_with("text/html"));
    assert!(response.body.contains("Sample 1 - Total Records"));
    assert!(response
        .body
        .contains("Sample 7 - Categories with &gt;30 Records"));
    assert!(response
        .body
        .contains("Sample 20 - Avg Value by Day &amp; Category"));
    assert_eq!(response.body.matches("<option ").count(), labels.len());
}

#[tokio::test]
async fn test_get_query_returns_sql_text() {
    let response = post_query_key(
        app(Catalog::embedded().unwrap(), MockConnector::new()),
        "/get_query",
        "Sample 1 - Total Records",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type.starts_with("text/plain"));
    assert_eq!(response.body, TOTAL_RECORDS_SQL);
}

#[tokio::test]
async fn test_get_query_unknown_label_is_not_found() {
    let response = post_query_key(
        app(test_catalog(), MockConnector::new()),
        "/get_query",
        "Nope",
    )
    .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Unknown query: Nope" }));
}

#[tokio::test]
async fn test_get_output_returns_columns_and_rows() {
    let connector = MockConnector::new().with_result(TOTAL_RECORDS_SQL, total_records(10));
    let stats = connector.stats();

    let response = post_query_key(app(test_catalog(), connector), "/get_output", "Total").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type.starts_with("application/json"));
    assert_eq!(
        response.json(),
        json!({ "columns": ["total_records"], "rows": [[10]] })
    );
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.closed(), 1);
}

#[tokio::test]
async fn test_get_output_invalid_sql_reports_error_with_ok_status() {
    let connector = MockConnector::new();
    let stats = connector.stats();

    let response = post_query_key(app(test_catalog(), connector), "/get_output", "Broken").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body, json!({ "error": "syntax error at or near \"SELEC\"" }));
    assert!(body.get("columns").is_none());
    assert!(body.get("rows").is_none());
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.opened(), stats.closed());
}

#[tokio::test]
async fn test_get_output_connection_failure_reports_error() {
    let connector = MockConnector::new().failing_connect("connection refused");

    let response = post_query_key(app(test_catalog(), connector), "/get_output", "Total").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "error": "connection refused" }));
}

#[tokio::test]
async fn test_get_output_unknown_label_opens_no_connection() {
    let connector = MockConnector::new();
    let stats = connector.stats();

    let response = post_query_key(app(test_catalog(), connector), "/get_output", "Nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Unknown query: Nope" }));
    assert_eq!(stats.opened(), 0);
}

#[tokio::test]
async fn test_concurrent_runs_do_not_share_results() {
    // The first query finishes last, so any shared buffer would show up here.
    let connector = MockConnector::new()
        .with_delayed_result(
            "SELECT category FROM Dataset;",
            single_column("category", &["A", "B"]),
            Duration::from_millis(50),
        )
        .with_delayed_result(
            "SELECT label FROM Dataset;",
            single_column("label", &["x"]),
            Duration::from_millis(5),
        );
    let stats = connector.stats();
    let router = app(test_catalog(), connector);

    let (categories, labels) = tokio::join!(
        post_query_key(router.clone(), "/get_output", "Categories"),
        post_query_key(router.clone(), "/get_output", "Labels"),
    );

    assert_eq!(
        categories.json(),
        json!({ "columns": ["category"], "rows": [["A"], ["B"]] })
    );
    assert_eq!(labels.json(), json!({ "columns": ["label"], "rows": [["x"]] }));
    assert_eq!(stats.opened(), 2);
    assert_eq!(stats.open_now(), 0);
}

#[tokio::test]
async fn test_missing_form_field_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/get_output")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("other=1"))
        .unwrap();

    let response = send(app(test_catalog(), MockConnector::new()), request).await;

    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_health() {
    let response = get(app(test_catalog(), MockConnector::new()), "/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["queries"], 4);
}
