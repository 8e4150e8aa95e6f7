use serde::{Deserialize, Serialize};

/// Host-agnostic view of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    /// Host-computed merge readiness, e.g. `clean`. Absent while the host
    /// is still computing it.
    #[serde(default)]
    pub mergeable_state: Option<String>,
    pub head_sha: String,
    pub head_ref: String,
    #[serde(default)]
    pub html_url: String,
}

/// Host-agnostic view of one CI check run tied to a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl CheckRun {
    pub fn is_success(&self) -> bool {
        self.conclusion.as_deref() == Some("success")
    }
}

/// Result of the conditional merge step for one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MergeOutcome {
    pub fn merged() -> Self {
        Self {
            merged: true,
            reason: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            merged: false,
            reason: Some(reason.into()),
        }
    }
}

/// The repository a run executes against, with its public page URL when
/// pages are enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoHandle {
    pub name: String,
    pub live_url: Option<String>,
}
