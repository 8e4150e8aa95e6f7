//! HTTP API data model.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use autoforge_core::api::{ExecutionOpts, PrSummary, RunError, Task, TaskResult};

// ============= Multi-agent run =============

#[derive(Debug, Deserialize)]
pub struct MultiAgentRunRequest {
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub constraints: Option<Value>,
    #[serde(default)]
    pub execution: Option<ExecutionOpts>,
}

#[derive(Debug, Serialize)]
pub struct MultiAgentRunResponse {
    pub status: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    pub tasks: Vec<TaskResult>,
    pub plan: Vec<Task>,
}

// ============= Pre-planned PRs =============

#[derive(Debug, Deserialize)]
pub struct GeneratePrsRequest {
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub execution: Option<ExecutionOpts>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePrsResponse {
    pub status: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    pub prs: Vec<PrSummary>,
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub connected_observers: usize,
    pub timestamp: String,
}

// ============= Shutdown =============

#[derive(Debug, Serialize)]
pub struct ShutdownResponse {
    pub status: String,
    pub message: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    Internal(String),
}

impl From<RunError> for HttpServerError {
    fn from(err: RunError) -> Self {
        // Every run-aborting failure surfaces as a 500 with the error text;
        // per-task outcomes never take this path.
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}
