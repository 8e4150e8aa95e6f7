use thiserror::Error;

/// Errors raised while building or ordering the task graph.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("circular dependency among tasks: {}", remaining.join(", "))]
    Cycle { remaining: Vec<String> },
}
