//! Mock database client for testing.
//!
//! Provides scripted, in-memory connections that count how many were opened
//! and released.

use super::{ColumnInfo, Connector, DatabaseClient, QueryResult, Value};
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Open/close counters shared by every client of one [`MockConnector`].
#[derive(Debug, Default)]
pub struct ConnectionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl ConnectionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Connections opened but not yet released.
    pub fn open_now(&self) -> usize {
        self.opened() - self.closed()
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Rows(QueryResult),
    Error(String),
}

#[derive(Debug, Clone)]
struct Script {
    response: Scripted,
    delay: Option<Duration>,
}

/// A connector that hands out [`MockDatabaseClient`]s with predefined results.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    scripts: Arc<HashMap<String, Script>>,
    connect_error: Option<String>,
    stats: Arc<ConnectionStats>,
}

impl MockConnector {
    /// Creates a connector with no scripted queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `result` whenever `sql` is executed.
    pub fn with_result(self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.with_script(sql, Scripted::Rows(result), None)
    }

    /// Returns `result` for `sql` after sleeping for `delay`.
    pub fn with_delayed_result(
        self,
        sql: impl Into<String>,
        result: QueryResult,
        delay: Duration,
    ) -> Self {
        self.with_script(sql, Scripted::Rows(result), Some(delay))
    }

    /// Fails with `message` whenever `sql` is executed.
    pub fn with_error(self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_script(sql, Scripted::Error(message.into()), None)
    }

    /// Makes every connection attempt fail with `message`.
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    fn with_script(
        mut self,
        sql: impl Into<String>,
        response: Scripted,
        delay: Option<Duration>,
    ) -> Self {
        Arc::make_mut(&mut self.scripts).insert(sql.into(), Script { response, delay });
        self
    }

    /// Counters for the connections this connector handed out.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        if let Some(message) = &self.connect_error {
            return Err(DashboardError::connection(message.clone()));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDatabaseClient {
            scripts: Arc::clone(&self.scripts),
            stats: Arc::clone(&self.stats),
            closed: false,
        }))
    }
}

/// A mock connection that answers from the connector's script.
///
/// Unscripted `SELECT` statements return a single mock row; any other
/// unscripted statement fails with a syntax error.
#[derive(Debug)]
pub struct MockDatabaseClient {
    scripts: Arc<HashMap<String, Script>>,
    stats: Arc<ConnectionStats>,
    closed: bool,
}

impl MockDatabaseClient {
    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        if self.closed {
            return Err(DashboardError::connection("connection already closed"));
        }

        if let Some(script) = self.scripts.get(sql) {
            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }
            return match &script.response {
                Scripted::Rows(result) => Ok(result.clone()),
                Scripted::Error(message) => Err(DashboardError::query(message.clone())),
            };
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let columns = vec![ColumnInfo::new("result", "text")];
            let rows = vec![vec![Value::String(format!("Mock result for: {sql}"))]];
            Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
        } else {
            let token = sql.split_whitespace().next().unwrap_or_default();
            Err(DashboardError::query(format!(
                "syntax error at or near \"{token}\""
            )))
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MockDatabaseClient {
    fn drop(&mut self) {
        self.release();
    }
}
