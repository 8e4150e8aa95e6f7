//! HTTP route handlers.

use std::time::Duration;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::Value;
use tower_http::timeout::TimeoutLayer;

use autoforge_core::api::ExecutionEvent;

use crate::http::{
    models::*,
    state::AppState,
    validation::{validate_objective, validate_supplied_tasks},
    ws::ws_handler,
};

/// Build the full router.
pub fn create_router(state: AppState) -> Router {
    // The request timeout applies to the cheap endpoints only: the run
    // endpoints may poll CI for minutes and must not be cut off mid-run.
    let cheap = Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .route("/api/v1/shutdown", post(shutdown_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.http_server.request_timeout_secs,
        )));

    Router::new()
        .route("/", get(ws_handler))
        .route("/multi-agent-run", post(multi_agent_run_handler))
        .route("/generate-repo-with-prs", post(generate_prs_handler))
        .merge(cheap)
        .with_state(state)
}

/// POST /multi-agent-run - plan, gate and execute one objective
async fn multi_agent_run_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiAgentRunRequest>,
) -> Result<Json<MultiAgentRunResponse>, HttpServerError> {
    {
        let mut stats = state.stats.write().unwrap();
        stats.increment_request("/multi-agent-run");
    }

    let objective = validate_objective(req.objective.as_deref())?;
    let opts = req.execution.unwrap_or_default();

    let coordinator = state.coordinator();
    match coordinator
        .run(&objective, req.constraints.as_ref(), &opts)
        .await
    {
        Ok(outcome) => Ok(Json(MultiAgentRunResponse {
            status: "ok".into(),
            repo: outcome.repo,
            live_url: outcome.live_url,
            tasks: outcome.tasks,
            plan: outcome.plan,
        })),
        Err(e) => {
            let mut stats = state.stats.write().unwrap();
            stats.increment_error();
            Err(e.into())
        }
    }
}

/// POST /generate-repo-with-prs - one PR per supplied task, no planning or
/// policy
async fn generate_prs_handler(
    State(state): State<AppState>,
    Json(req): Json<GeneratePrsRequest>,
) -> Result<Json<GeneratePrsResponse>, HttpServerError> {
    {
        let mut stats = state.stats.write().unwrap();
        stats.increment_request("/generate-repo-with-prs");
    }

    let objective = validate_objective(req.objective.as_deref())?;
    let tasks = validate_supplied_tasks(req.tasks)?;
    let opts = req.execution.unwrap_or_default();

    let coordinator = state.coordinator();
    match coordinator.run_direct(&objective, &tasks, &opts).await {
        Ok(outcome) => Ok(Json(GeneratePrsResponse {
            status: "success".into(),
            repo: outcome.repo,
            live_url: outcome.live_url,
            prs: outcome.prs,
        })),
        Err(e) => {
            let mut stats = state.stats.write().unwrap();
            stats.increment_error();
            Err(e.into())
        }
    }
}

/// POST /webhook - host webhook intake; always 200
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<Value>>,
) -> Json<Value> {
    {
        let mut stats = state.stats.write().unwrap();
        stats.increment_request("/webhook");
    }

    let kind = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match payload.and_then(|Json(body)| webhook_event(kind, &body)) {
        Some(event) => state.broadcaster.emit(event).await,
        None => tracing::debug!(kind, "ignoring webhook event"),
    }

    Json(serde_json::json!({"ok": true}))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime, requests) = {
        let stats = state.stats.read().unwrap();
        (stats.uptime_seconds(), stats.requests_total)
    };
    Json(HealthResponse {
        status: "ok".into(),
        session_id: state.session_id.clone(),
        uptime_seconds: uptime,
        requests_handled: requests,
        connected_observers: state.broadcaster.observer_count(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// POST /api/v1/shutdown - trigger graceful shutdown, responding first
async fn shutdown_handler(State(state): State<AppState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());
    Json(ShutdownResponse {
        status: "ok".into(),
        message: "shutting down".into(),
    })
}

/// Map a host webhook payload to a broadcast event. Unknown event kinds and
/// malformed payloads map to `None` (ignored, never an error).
pub(crate) fn webhook_event(kind: &str, payload: &Value) -> Option<ExecutionEvent> {
    let repo = payload["repository"]["name"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    match kind {
        "check_run" => {
            let run = payload.get("check_run")?;
            Some(ExecutionEvent::CiUpdate {
                repo,
                sha: run["head_sha"].as_str().unwrap_or_default().to_string(),
                status: run["status"].as_str().unwrap_or_default().to_string(),
                conclusion: run["conclusion"].as_str().map(String::from),
            })
        }
        "pull_request" => {
            let pr = payload.get("pull_request")?;
            Some(ExecutionEvent::PrUpdate {
                repo,
                pr_number: pr["number"].as_u64().unwrap_or_default(),
                sha: pr["head"]["sha"].as_str().unwrap_or_default().to_string(),
                state: pr["state"].as_str().unwrap_or_default().to_string(),
                merged: pr["merged"].as_bool().unwrap_or(false),
            })
        }
        _ => None,
    }
}
