//! Database abstraction layer.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably. Every client
//! wraps exactly one connection; nothing here pools or shares connections.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{ConnectionStats, MockConnector, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }
}

/// Opens a single connection for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// One open database connection.
///
/// Dropping a client without calling [`close`](DatabaseClient::close) still
/// releases the underlying connection.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a single SQL statement and returns all of its rows.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Source of fresh database connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new connection.
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector that opens connections from a [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConfigConnector {
    config: ConnectionConfig,
}

impl ConfigConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for ConfigConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        connect(&self.config).await
    }
}
