//! Error types for the query dashboard.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for dashboard operations.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The requested label is not part of the query catalog.
    #[error("Unknown query: {0}")]
    NotFound(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("{0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("{0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad catalog, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// Creates a not-found error for the given label.
    pub fn not_found(label: impl Into<String>) -> Self {
        Self::NotFound(label.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for failures raised while connecting to or querying the database.
    ///
    /// These are reported to the browser inside a normal response body.
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Query(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Not Found",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// Result type alias using DashboardError.
pub type Result<T> = std::result::Result<T, DashboardError>;
