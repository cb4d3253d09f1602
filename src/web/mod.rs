//! HTTP surface of the dashboard.
//!
//! `GET /` renders the catalog, `POST /get_query` returns a query's SQL text
//! and `POST /get_output` runs it. Requests share nothing mutable: the catalog
//! is read-only and every execution opens its own connection.

mod handlers;
mod page;

pub use handlers::QueryOutput;

use crate::catalog::Catalog;
use crate::error::DashboardError;
use crate::gateway::Gateway;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared state passed to all handlers via axum State.
#[derive(Debug)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, gateway: Gateway) -> Self {
        Self { catalog, gateway }
    }
}

/// Builds the axum Router with all dashboard endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/get_query", post(handlers::get_query))
        .route("/get_output", post(handlers::get_output))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serves the dashboard on `addr` until the process is stopped.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Unknown labels become 404s. Database failures keep a 200 status and carry
/// the driver message in an `error` field; clients tell success from failure
/// by the body shape.
impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_execution_error() => StatusCode::OK,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
