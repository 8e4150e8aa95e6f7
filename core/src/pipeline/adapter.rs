use std::sync::Arc;

use crate::error::RunError;
use crate::scheduler::Task;

use super::traits::{CoderPlugin, VerifierPlugin};
use super::types::{Patch, Verdict};

/// Drives the code and verify capabilities for one task.
///
/// No retries at this layer: a capability error propagates as
/// [`RunError::Capability`] and aborts the run. The adapter performs shape
/// validation only; business judgment lives in the policy gate.
#[derive(Clone)]
pub struct AgentPipeline {
    coder: Arc<dyn CoderPlugin>,
    verifier: Arc<dyn VerifierPlugin>,
}

impl AgentPipeline {
    pub fn new(coder: Arc<dyn CoderPlugin>, verifier: Arc<dyn VerifierPlugin>) -> Self {
        Self { coder, verifier }
    }

    pub async fn run(&self, objective: &str, task: &Task) -> Result<(Patch, Verdict), RunError> {
        tracing::debug!(task_id = task.id.as_str(), "pipeline: coding");
        let patch = self
            .coder
            .code(objective, task)
            .await
            .map_err(|e| RunError::capability("coder", e))?;
        validate_patch(&patch)?;

        tracing::debug!(
            task_id = task.id.as_str(),
            branch = patch.branch.as_str(),
            commits = patch.commits.len(),
            "pipeline: verifying"
        );
        let verdict = self
            .verifier
            .verify(task, &patch)
            .await
            .map_err(|e| RunError::capability("verifier", e))?;

        Ok((patch, verdict))
    }

    /// Coder only, for the direct path: shape-validated patch, no
    /// verification.
    pub async fn code(&self, objective: &str, task: &Task) -> Result<Patch, RunError> {
        let patch = self
            .coder
            .code(objective, task)
            .await
            .map_err(|e| RunError::capability("coder", e))?;
        validate_patch(&patch)?;
        Ok(patch)
    }
}

/// A patch must name a branch and carry at least one commit with at least
/// one file edit.
fn validate_patch(patch: &Patch) -> Result<(), RunError> {
    if patch.branch.trim().is_empty() {
        return Err(RunError::InvalidPatch("branch name is empty".into()));
    }
    if patch.commits.is_empty() {
        return Err(RunError::InvalidPatch("patch has no commits".into()));
    }
    if !patch.commits.iter().any(|c| !c.files.is_empty()) {
        return Err(RunError::InvalidPatch(
            "patch commits contain no file edits".into(),
        ));
    }
    Ok(())
}
