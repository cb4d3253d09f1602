//! Request handlers.

use super::{page, AppState};
use crate::db::{QueryResult, Row};
use crate::error::DashboardError;
use axum::extract::{Form, State};
use axum::response::{Html, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Form body sent by the dashboard page.
#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub query_key: String,
}

/// Successful `/get_output` body.
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl From<QueryResult> for QueryOutput {
    fn from(result: QueryResult) -> Self {
        Self {
            columns: result.column_names(),
            rows: result.rows,
        }
    }
}

/// `GET /`: the catalog as a selectable list.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render_index(&state.catalog))
}

/// `POST /get_query`: the raw SQL text for a label.
pub async fn get_query(
    State(state): State<Arc<AppState>>,
    Form(form): Form<QueryForm>,
) -> Result<String, DashboardError> {
    let text = state.catalog.get_text(&form.query_key).inspect_err(|_| {
        warn!("Unknown query requested: {}", form.query_key);
    })?;
    Ok(text.to_string())
}

/// `POST /get_output`: runs the query for a label and returns its rows.
pub async fn get_output(
    State(state): State<Arc<AppState>>,
    Form(form): Form<QueryForm>,
) -> Result<Json<QueryOutput>, DashboardError> {
    let sql = state.catalog.get_text(&form.query_key).inspect_err(|_| {
        warn!("Unknown query requested: {}", form.query_key);
    })?;

    info!("Running query '{}'", form.query_key);
    match state.gateway.execute(sql).await {
        Ok(result) => {
            info!(
                "Query '{}' returned {} rows in {:?}",
                form.query_key,
                result.row_count(),
                result.execution_time
            );
            Ok(Json(result.into()))
        }
        Err(e) => {
            warn!("Query '{}' failed: {}: {}", form.query_key, e.category(), e);
            Err(e)
        }
    }
}

/// `GET /health`: liveness check.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "queries": state.catalog.len(),
    }))
}
