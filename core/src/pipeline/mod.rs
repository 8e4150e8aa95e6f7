//! The plan/code/verify capability contract and its per-task adapter.

mod adapter;
mod traits;
mod types;

pub use adapter::AgentPipeline;
pub use traits::{CoderPlugin, PlannerPlugin, VerifierPlugin};
pub use types::{Commit, FileEdit, Patch, PullRequestSpec, TestFile, Verdict, VerdictStatus};
