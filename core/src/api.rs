//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `autoforge_core::api` instead of reaching into
//! internal modules.

pub use crate::config::{
    get_data_dir, load_default, AgentServiceConfig, AppConfig, EventSinkConfig, ExecutionConfig,
    GithubConfig, HttpServerConfig, LoggingConfig, PolicyConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::coordinator::{
    DirectOutcome, ExecutionOpts, PrSummary, RunCoordinator, RunOutcome, TaskResult,
};
pub use crate::error::{CliError, RunError, ScheduleError};
pub use crate::events::{EventBroadcaster, EventSinkTx, ExecutionEvent, Observer};
pub use crate::execution::{CheckRun, HostApi, HostExecutor, MergeOutcome, PullRequest, RepoHandle};
pub use crate::pipeline::{
    AgentPipeline, CoderPlugin, Commit, FileEdit, Patch, PlannerPlugin, PullRequestSpec, TestFile,
    Verdict, VerdictStatus, VerifierPlugin,
};
pub use crate::policy::{BudgetUsage, PolicyDecision, PolicyGate, PolicyInput, RiskLevel};
pub use crate::scheduler::{Task, TaskGraph, TaskLike};
pub use crate::util::repo_slug;
