use serde::{Deserialize, Serialize};

use crate::execution::MergeOutcome;
use crate::pipeline::Verdict;
use crate::policy::{BudgetUsage, PolicyDecision};
use crate::scheduler::Task;

/// Caller-controlled knobs for one run, deserialized from the request's
/// `execution` object. Everything is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOpts {
    /// Merge each PR once CI is green. Off by default.
    #[serde(default)]
    pub auto_merge: bool,

    /// Enable the repository's public page and report its URL.
    #[serde(default)]
    pub enable_pages: bool,

    /// Caller-supplied CI conclusion fed to the policy gate; defaults to
    /// `success` when absent.
    #[serde(default)]
    pub ci_conclusion: Option<String>,

    #[serde(default)]
    pub tokens_used: u64,

    #[serde(default)]
    pub api_calls: u64,

    /// Override for stage-level concurrency; `None` uses the configured
    /// default (1 = strictly sequential).
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

impl ExecutionOpts {
    pub fn ci_conclusion(&self) -> &str {
        self.ci_conclusion.as_deref().unwrap_or("success")
    }

    pub fn budget(&self) -> BudgetUsage {
        BudgetUsage {
            tokens_used: self.tokens_used,
            api_calls: self.api_calls,
        }
    }
}

/// Terminal outcome of one task. A task never leaves its terminal state;
/// retrying means re-invoking the whole run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskResult {
    /// Verification failed; nothing reached the host for this task.
    Blocked { task_id: String, verdict: Verdict },

    /// The policy gate denied integration.
    BlockedByPolicy {
        task_id: String,
        decision: PolicyDecision,
    },

    /// A pull request exists (created or reused); merge may have happened,
    /// been skipped, or failed to go green.
    PrOpened {
        task_id: String,
        branch: String,
        pr_number: u64,
        pr_url: String,
        decision: PolicyDecision,
        merge: MergeOutcome,
    },
}

impl TaskResult {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Blocked { task_id, .. }
            | Self::BlockedByPolicy { task_id, .. }
            | Self::PrOpened { task_id, .. } => task_id,
        }
    }
}

/// Aggregate result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub repo: String,
    pub live_url: Option<String>,
    pub plan: Vec<Task>,
    pub tasks: Vec<TaskResult>,
}

/// One pull request opened by the direct (pre-planned) path.
#[derive(Debug, Clone, Serialize)]
pub struct PrSummary {
    pub task_id: String,
    pub branch: String,
    pub pr_number: u64,
    pub pr_url: String,
}

/// Aggregate result of the direct path.
#[derive(Debug, Clone, Serialize)]
pub struct DirectOutcome {
    pub repo: String,
    pub live_url: Option<String>,
    pub prs: Vec<PrSummary>,
}
