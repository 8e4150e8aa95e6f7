use serde::{Deserialize, Serialize};

pub use crate::execution::ExecutionConfig;
pub use crate::policy::PolicyConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub events: EventSinkConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub agents: AgentServiceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            github: GithubConfig::default(),
            policy: PolicyConfig::default(),
            execution: ExecutionConfig::default(),
            events: EventSinkConfig::default(),
            http_server: HttpServerConfig::default(),
            agents: AgentServiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "autoforge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Source-control host access. Token and owner come from the environment
/// (`GITHUB_TOKEN`, `GITHUB_OWNER`) with the config file as fallback; both
/// must be present at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub owner: String,

    #[serde(default, skip_serializing)]
    pub token: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_default_branch")]
    pub default_branch: String,

    #[serde(default = "default_github_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    "autoforge".to_string()
}

fn default_default_branch() -> String {
    "main".to_string()
}

fn default_github_timeout_ms() -> u64 {
    30_000
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            token: String::new(),
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            default_branch: default_default_branch(),
            timeout_ms: default_github_timeout_ms(),
        }
    }
}

impl GithubConfig {
    /// Environment wins over the config file.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.trim().is_empty() {
                self.token = token;
            }
        }
        if let Ok(owner) = std::env::var("GITHUB_OWNER") {
            if !owner.trim().is_empty() {
                self.owner = owner;
            }
        }
        if let Ok(base) = std::env::var("AUTOFORGE_GITHUB_API") {
            if !base.trim().is_empty() {
                self.api_base = base;
            }
        }
    }

    /// Both credentials must be present at startup; absence is fatal for
    /// the process, not a per-request error.
    pub fn require_credentials(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("missing GITHUB_TOKEN (environment or [github].token)".to_string());
        }
        if self.owner.trim().is_empty() {
            return Err("missing GITHUB_OWNER (environment or [github].owner)".to_string());
        }
        Ok(())
    }
}

/// JSONL diagnostics tap for broadcast events. Disabled by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSinkConfig {
    #[serde(default)]
    pub enabled: bool,

    /// File path, or "stdout:" for standard output.
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_sink_capacity")]
    pub channel_capacity: usize,

    #[serde(default = "default_sink_drop_when_full")]
    pub drop_when_full: bool,
}

fn default_sink_capacity() -> usize {
    256
}

fn default_sink_drop_when_full() -> bool {
    true
}

impl Default for EventSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            channel_capacity: default_sink_capacity(),
            drop_when_full: default_sink_drop_when_full(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Applies to the cheap endpoints only; run endpoints may poll CI for
    /// minutes and are exempt.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_broadcast_capacity() -> usize {
    256
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            request_timeout_secs: default_request_timeout_secs(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// The HTTP service hosting the planning/coding/verification capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentServiceConfig {
    #[serde(default = "default_agents_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: String,

    #[serde(default = "default_agents_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_agents_base_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_agents_timeout_ms() -> u64 {
    120_000
}

impl Default for AgentServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_agents_base_url(),
            api_key: String::new(),
            timeout_ms: default_agents_timeout_ms(),
        }
    }
}
