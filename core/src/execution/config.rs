use serde::{Deserialize, Serialize};

/// Knobs for the host execution adapter. Part of
/// [`crate::config::AppConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// CI polling attempts before `wait_for_green` gives up.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Delay between CI polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Double the poll delay after each attempt (capped by
    /// `poll_max_interval_ms`). Off by default: polling runs at a fixed
    /// interval.
    #[serde(default)]
    pub poll_backoff: bool,

    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// Tasks processed concurrently within one dependency stage. 1 means
    /// strictly sequential execution.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_poll_max_attempts() -> u32 {
    20
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_poll_max_interval_ms() -> u64 {
    30_000
}

fn default_max_parallel() -> usize {
    1
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_max_attempts: default_poll_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_backoff: false,
            poll_max_interval_ms: default_poll_max_interval_ms(),
            max_parallel: default_max_parallel(),
        }
    }
}
