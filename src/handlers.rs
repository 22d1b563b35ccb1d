use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{debug, info};

use crate::connection::GatewayState;
use crate::driver_mysql::{self, QueryOutput, driver_message};
use crate::models::{
    ConnectRequest, ErrorResponse, FormatResponse, HealthResponse, LintResponse, MessageResponse,
    QueryRequest, QueryResponse,
};
use crate::{GatewayError, Result, export, helpers, query_tools};

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Invalid(_) | GatewayError::NotConnected | GatewayError::Query(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Connect(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// `POST /api/connect`: open a pool against the named database and make it
/// the active connection. Replaces (and closes) any previous one.
pub async fn connect(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<MessageResponse>> {
    let database = helpers::trimmed_non_empty(&request.database)
        .ok_or_else(|| GatewayError::Invalid("Invalid or empty database name".to_string()))?;

    state
        .connect(database)
        .await
        .map_err(|err| GatewayError::Connect(driver_message(&err)))?;

    info!("Connected to database: {}", database);
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Connected to database: {}", database),
    }))
}

/// `POST /api/run-query`: forward the statement text unmodified and relay
/// rows or the driver's error message.
pub async fn run_query(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let (output, elapsed_ms) = execute(&state, &request.query).await?;
    Ok(Json(QueryResponse {
        success: true,
        results: output.rows,
        columns: output.columns,
        row_count: output.total_rows,
        truncated: output.truncated,
        elapsed_ms,
    }))
}

/// `POST /api/disconnect`: close the active pool if there is one. Always
/// succeeds, so clients can fire it without caring about current state.
pub async fn disconnect(State(state): State<Arc<GatewayState>>) -> Json<MessageResponse> {
    let message = match state.disconnect().await {
        Some(database) => {
            info!("Disconnected from database: {}", database);
            format!("Disconnected from database: {}", database)
        }
        None => "No active connection".to_string(),
    };
    Json(MessageResponse {
        success: true,
        message,
    })
}

/// `GET /api/health`: connection status plus the build version.
pub async fn health(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    let database = state.database().await;
    Json(HealthResponse {
        success: true,
        connected: database.is_some(),
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/format`: pretty-print a statement. No database involved.
pub async fn format_query(Json(request): Json<QueryRequest>) -> Result<Json<FormatResponse>> {
    let query = require_query(&request.query)?;
    Ok(Json(FormatResponse {
        success: true,
        formatted: query_tools::format_sql(query),
    }))
}

/// `POST /api/lint`: heuristic checks for a statement. No database involved.
pub async fn lint_query(Json(request): Json<QueryRequest>) -> Result<Json<LintResponse>> {
    let query = require_query(&request.query)?;
    Ok(Json(LintResponse {
        success: true,
        messages: query_tools::lint_sql(query),
    }))
}

/// `POST /api/export`: run the statement through the same path as
/// `run-query` and return the full (capped) result as a CSV attachment.
pub async fn export_csv(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Response> {
    let (output, _elapsed_ms) = execute(&state, &request.query).await?;
    let database = state.database().await.unwrap_or_else(|| "export".to_string());

    let bytes = export::csv_bytes(&output)?;
    let filename = export::export_filename(&database);
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes).into_response())
}

fn require_query(raw: &str) -> Result<&str> {
    helpers::trimmed_non_empty(raw)
        .ok_or_else(|| GatewayError::Invalid("Invalid or empty query".to_string()))
}

/// Shared validate-then-execute path for `run-query` and `export`.
/// Order matters: query text, then the read-only guard, then the connection
/// slot, so a rejected statement never reports a connection problem.
async fn execute(state: &GatewayState, raw_query: &str) -> Result<(QueryOutput, u64)> {
    let query = require_query(raw_query)?;

    if state.config.read_only && !query_tools::is_read_statement(query) {
        return Err(GatewayError::Invalid(
            "Read-only mode: only SELECT, SHOW, DESCRIBE and EXPLAIN statements are allowed"
                .to_string(),
        ));
    }

    let conn = state.current().await.ok_or(GatewayError::NotConnected)?;

    let started = Instant::now();
    let result = driver_mysql::run_query(&conn.pool, query, state.config.max_rows).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(output) => {
            debug!(
                "query on '{}' returned {} rows in {} ms{}",
                conn.database,
                output.total_rows,
                elapsed_ms,
                if output.truncated { " (truncated)" } else { "" }
            );
            Ok((output, elapsed_ms))
        }
        Err(err) => Err(GatewayError::Query(driver_message(&err))),
    }
}
