//! SQLite database client implementation.
//!
//! Opens one connection to an existing database file per client. Useful for
//! local demos and tests that need a real database without a server.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{
    Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef,
};
use std::time::Instant;
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    conn: Option<SqliteConnection>,
}

impl SqliteClient {
    /// Opens the configured database file. The file must already exist.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let path = config.database.as_deref().unwrap_or_default();

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);

        let conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| DashboardError::connection(e.to_string()))?;

        debug!("Opened connection to {}", config.display_string());
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DashboardError::connection("connection already closed"))?;
        let start = Instant::now();

        let statement = (&mut *conn)
            .prepare(sql)
            .await
            .map_err(|e| DashboardError::query(e.to_string()))?;

        let columns: Vec<ColumnInfo> = statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();

        let rows: Vec<SqliteRow> = statement
            .query()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DashboardError::query(e.to_string()))?;

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| DashboardError::connection(e.to_string()))?;
        }
        Ok(())
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts by the storage class of the stored value, since SQLite columns
/// are not strictly typed.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
