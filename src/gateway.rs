//! Database gateway: one connection per execution.
//!
//! Opens a fresh connection, runs exactly one statement, pulls the whole result
//! set into memory and closes the connection on every exit path. There is no
//! pooling, retry, timeout or row cap.

use crate::db::{Connector, QueryResult};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes catalog SQL against the configured database.
#[derive(Clone)]
pub struct Gateway {
    connector: Arc<dyn Connector>,
}

impl Gateway {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Runs `sql` on a new connection and returns all rows.
    ///
    /// Connection, execution and fetch failures are all returned as errors
    /// carrying the driver's message. The connection is closed whether or not
    /// the statement succeeded; if this future is dropped mid-flight the client
    /// is released by its `Drop`.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let mut client = self.connector.connect().await?;
        debug!("Connection opened");

        let result = client.execute_query(sql).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close connection cleanly: {}", e);
        }
        debug!("Connection closed");

        result
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}
