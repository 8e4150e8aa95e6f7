use async_trait::async_trait;
use serde_json::Value;

use crate::scheduler::Task;

use super::types::{Patch, Verdict};

/// Planning capability: decompose an objective into a task list.
#[async_trait]
pub trait PlannerPlugin: Send + Sync {
    async fn plan(&self, objective: &str, constraints: Option<&Value>)
        -> anyhow::Result<Vec<Task>>;
}

/// Coding capability: produce the patch for one task.
#[async_trait]
pub trait CoderPlugin: Send + Sync {
    async fn code(&self, objective: &str, task: &Task) -> anyhow::Result<Patch>;
}

/// Verification capability: judge a patch, optionally attaching test files.
#[async_trait]
pub trait VerifierPlugin: Send + Sync {
    async fn verify(&self, task: &Task, patch: &Patch) -> anyhow::Result<Verdict>;
}
