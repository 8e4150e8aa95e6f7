use thiserror::Error;

use super::schedule::ScheduleError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("run failed: {0}")]
    Run(#[from] RunError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Run-aborting failures. Per-task outcomes (verifier fail, policy denial,
/// CI never green) are not errors; they land in the task result instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(String),
    #[error("scheduling failed: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("{stage} capability failed: {source}")]
    Capability {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("host api error: {0}")]
    Host(#[source] anyhow::Error),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}

impl RunError {
    pub fn capability(stage: &'static str, source: anyhow::Error) -> Self {
        Self::Capability { stage, source }
    }
}
