use serde::{Deserialize, Serialize};

/// A transient status event fanned out to live observers. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    CiUpdate {
        repo: String,
        sha: String,
        status: String,
        #[serde(default)]
        conclusion: Option<String>,
    },
    PrUpdate {
        repo: String,
        pr_number: u64,
        sha: String,
        state: String,
        #[serde(default)]
        merged: bool,
    },
}
