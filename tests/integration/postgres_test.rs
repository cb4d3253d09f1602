//! Gateway tests against a live PostgreSQL server.
//!
//! Skipped unless DATABASE_URL is set.

use query_dashboard::config::ConnectionConfig;
use query_dashboard::db::{ConfigConnector, Value};
use query_dashboard::gateway::Gateway;
use std::sync::Arc;

fn test_gateway() -> Option<Gateway> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    Some(Gateway::new(Arc::new(ConfigConnector::new(config))))
}

#[tokio::test]
async fn test_count_over_generated_rows() {
    let Some(gateway) = test_gateway() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = gateway
        .execute("SELECT COUNT(*) AS total_records FROM generate_series(1, 10);")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["total_records"]);
    assert_eq!(result.rows, vec![vec![Value::Int(10)]]);
}

#[tokio::test]
async fn test_average_is_exact_decimal() {
    let Some(gateway) = test_gateway() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = gateway
        .execute("SELECT AVG(x) AS avg_value FROM generate_series(1, 4) AS x;")
        .await
        .unwrap();

    assert_eq!(result.rows, vec![vec![Value::Decimal("2.5000000000000000".into())]]);
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let Some(gateway) = test_gateway() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = gateway.execute("SELEC 1").await.unwrap_err();
    assert!(err.is_execution_error());
    assert!(err.to_string().contains("syntax error"));
}

#[tokio::test]
async fn test_timestamps_are_iso_strings() {
    let Some(gateway) = test_gateway() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = gateway
        .execute("SELECT date_trunc('day', TIMESTAMP '2025-07-25 13:45:00') AS day;")
        .await
        .unwrap();

    assert_eq!(result.rows, vec![vec![Value::Timestamp("2025-07-25T00:00:00".into())]]);
}
