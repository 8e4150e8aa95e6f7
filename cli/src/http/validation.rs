//! Request validation.

use autoforge_core::api::Task;

use super::models::HttpServerError;

/// Cap on tasks accepted by the pre-planned PRs endpoint.
pub const MAX_DIRECT_TASKS: usize = 25;

/// The objective is the one mandatory field of a run request.
pub fn validate_objective(objective: Option<&str>) -> Result<String, HttpServerError> {
    let Some(objective) = objective else {
        return Err(HttpServerError::InvalidRequest(
            "objective is required".to_string(),
        ));
    };
    let trimmed = objective.trim();
    if trimmed.is_empty() {
        return Err(HttpServerError::InvalidRequest(
            "objective is required".to_string(),
        ));
    }
    if trimmed.len() > 10_000 {
        return Err(HttpServerError::InvalidRequest(format!(
            "objective too long ({} chars, max 10000)",
            trimmed.len()
        )));
    }
    Ok(trimmed.to_string())
}

/// Supplied task lists must be present, non-empty and within the cap.
pub fn validate_supplied_tasks(tasks: Option<Vec<Task>>) -> Result<Vec<Task>, HttpServerError> {
    let Some(tasks) = tasks else {
        return Err(HttpServerError::InvalidRequest(
            "tasks are required".to_string(),
        ));
    };
    if tasks.is_empty() {
        return Err(HttpServerError::InvalidRequest(
            "tasks are required".to_string(),
        ));
    }
    if tasks.len() > MAX_DIRECT_TASKS {
        return Err(HttpServerError::InvalidRequest(format!(
            "too many tasks ({}, max {})",
            tasks.len(),
            MAX_DIRECT_TASKS
        )));
    }
    for task in &tasks {
        if task.id.trim().is_empty() {
            return Err(HttpServerError::InvalidRequest(
                "task id cannot be empty".to_string(),
            ));
        }
    }
    Ok(tasks)
}
