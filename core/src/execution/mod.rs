//! Source-control host execution: idempotent branch/commit/PR sequencing
//! with bounded CI polling.

mod config;
mod executor;
mod host;
mod types;

pub use config::ExecutionConfig;
pub use executor::HostExecutor;
pub use host::HostApi;
pub use types::{CheckRun, MergeOutcome, PullRequest, RepoHandle};
