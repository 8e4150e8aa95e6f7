use async_trait::async_trait;
use serde_json::Value;

use super::types::{CheckRun, PullRequest};

/// Low-level source-control host surface.
///
/// One method per REST operation, no sequencing logic; idempotency and
/// polling live in [`super::HostExecutor`]. The GitHub implementation lives
/// in the plugins crate; tests substitute a recording mock.
///
/// Optional getters return `Ok(None)` for "not found"; every other non-2xx
/// host response is an error carrying method, path, status and body.
#[async_trait]
pub trait HostApi: Send + Sync {
    async fn get_repo(&self, repo: &str) -> anyhow::Result<Option<Value>>;

    async fn create_repo(&self, repo: &str, description: &str) -> anyhow::Result<Value>;

    /// Idempotent: enabling pages on a repo that already has them is a no-op.
    async fn enable_pages(&self, repo: &str, branch: &str) -> anyhow::Result<()>;

    async fn get_ref_sha(&self, repo: &str, branch: &str) -> anyhow::Result<Option<String>>;

    async fn create_ref(&self, repo: &str, branch: &str, sha: &str) -> anyhow::Result<()>;

    async fn get_file_sha(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> anyhow::Result<Option<String>>;

    /// Writes `content` at `path`; `sha` is the precondition for updating
    /// an existing file.
    async fn put_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> anyhow::Result<()>;

    async fn list_open_pulls(
        &self,
        repo: &str,
        head: &str,
        base: &str,
    ) -> anyhow::Result<Vec<PullRequest>>;

    async fn create_pull(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<PullRequest>;

    async fn get_pull(&self, repo: &str, number: u64) -> anyhow::Result<PullRequest>;

    async fn merge_pull_squash(&self, repo: &str, number: u64) -> anyhow::Result<bool>;

    async fn list_check_runs(&self, repo: &str, sha: &str) -> anyhow::Result<Vec<CheckRun>>;

    async fn protect_branch(&self, repo: &str, branch: &str) -> anyhow::Result<()>;
}
