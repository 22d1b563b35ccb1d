use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query_tools::LintMessage;

/// Body of `POST /api/connect`.
///
/// `database` defaults to empty when the field is missing so the handler can
/// answer with the gateway's validation message instead of a decode error.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub database: String,
}

/// Body of the query-carrying endpoints: `run-query`, `format`, `lint`,
/// `export`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Successful `run-query` payload. `results` holds one JSON object per row;
/// `columns` carries the statement's column order, which the objects alone
/// cannot.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub results: Vec<Map<String, Value>>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub truncated: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub success: bool,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct LintResponse {
    pub success: bool,
    pub messages: Vec<LintMessage>,
}
