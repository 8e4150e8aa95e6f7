use std::sync::Arc;
use std::time::Duration;

use crate::error::RunError;
use crate::pipeline::{Patch, TestFile};

use super::config::ExecutionConfig;
use super::host::HostApi;
use super::types::{MergeOutcome, PullRequest, RepoHandle};

/// Sequences idempotent host operations for approved patches.
///
/// Every operation checks live host state first: existing branches, files
/// and pull requests are reused, so re-running a partially failed run is
/// safe without explicit recovery logic. Host state is never cached between
/// calls.
#[derive(Clone)]
pub struct HostExecutor {
    host: Arc<dyn HostApi>,
    cfg: ExecutionConfig,
    owner: String,
    default_branch: String,
}

impl HostExecutor {
    pub fn new(
        host: Arc<dyn HostApi>,
        cfg: ExecutionConfig,
        owner: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        Self {
            host,
            cfg,
            owner: owner.into(),
            default_branch: default_branch.into(),
        }
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Reuse the repository if it exists, otherwise create it; optionally
    /// enable the public page for it.
    pub async fn ensure_repo(
        &self,
        name: &str,
        description: &str,
        pages: bool,
    ) -> Result<RepoHandle, RunError> {
        let existing = self.host.get_repo(name).await.map_err(RunError::Host)?;
        if existing.is_none() {
            tracing::info!(repo = name, "creating repository");
            self.host
                .create_repo(name, description)
                .await
                .map_err(RunError::Host)?;
        } else {
            tracing::debug!(repo = name, "repository already exists");
        }

        let live_url = if pages {
            self.host
                .enable_pages(name, &self.default_branch)
                .await
                .map_err(RunError::Host)?;
            Some(format!("https://{}.github.io/{}", self.owner, name))
        } else {
            None
        };

        Ok(RepoHandle {
            name: name.to_string(),
            live_url,
        })
    }

    /// No-op when `new` already exists; otherwise point it at `base`'s head.
    pub async fn ensure_branch_from(
        &self,
        repo: &str,
        base: &str,
        new: &str,
    ) -> Result<(), RunError> {
        if self
            .host
            .get_ref_sha(repo, new)
            .await
            .map_err(RunError::Host)?
            .is_some()
        {
            tracing::debug!(repo, branch = new, "branch already exists");
            return Ok(());
        }

        let base_sha = self
            .host
            .get_ref_sha(repo, base)
            .await
            .map_err(RunError::Host)?
            .ok_or_else(|| {
                RunError::Host(anyhow::anyhow!("base branch '{base}' not found in '{repo}'"))
            })?;

        tracing::info!(repo, branch = new, base, "creating branch");
        self.host
            .create_ref(repo, new, &base_sha)
            .await
            .map_err(RunError::Host)
    }

    /// Read-then-write so the host sees a proper update, not a blind
    /// overwrite.
    pub async fn upsert_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), RunError> {
        let sha = self
            .host
            .get_file_sha(repo, branch, path)
            .await
            .map_err(RunError::Host)?;
        self.host
            .put_file(repo, branch, path, content, message, sha.as_deref())
            .await
            .map_err(RunError::Host)
    }

    /// Upload the patch's commits in order, then verifier test artifacts.
    pub async fn push_patch(
        &self,
        repo: &str,
        branch: &str,
        patch: &Patch,
        test_files: &[TestFile],
    ) -> Result<(), RunError> {
        for commit in &patch.commits {
            for file in &commit.files {
                self.upsert_file(repo, branch, &file.path, &file.content, &commit.message)
                    .await?;
            }
        }
        for test in test_files {
            self.upsert_file(
                repo,
                branch,
                &test.path,
                &test.content,
                "test: add generated verification tests",
            )
            .await?;
        }
        Ok(())
    }

    /// Reuse the open pull request for head/base when one exists; avoids
    /// duplicate PRs on re-runs.
    pub async fn open_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, RunError> {
        let open = self
            .host
            .list_open_pulls(repo, head, base)
            .await
            .map_err(RunError::Host)?;
        if let Some(pr) = open.into_iter().next() {
            tracing::debug!(repo, head, number = pr.number, "reusing open pull request");
            return Ok(pr);
        }

        tracing::info!(repo, head, base, "opening pull request");
        self.host
            .create_pull(repo, head, base, title, body)
            .await
            .map_err(RunError::Host)
    }

    /// Poll PR mergeability and check runs until green or attempts run out.
    ///
    /// Green means: mergeable state `clean` AND at least one check run AND
    /// every check-run conclusion `success`. Exhaustion is a negative
    /// result, not an error.
    pub async fn wait_for_green(&self, repo: &str, number: u64) -> Result<bool, RunError> {
        let mut interval = Duration::from_millis(self.cfg.poll_interval_ms);

        for attempt in 1..=self.cfg.poll_max_attempts {
            let pr = self
                .host
                .get_pull(repo, number)
                .await
                .map_err(RunError::Host)?;
            let checks = self
                .host
                .list_check_runs(repo, &pr.head_sha)
                .await
                .map_err(RunError::Host)?;

            let clean = pr.mergeable_state.as_deref() == Some("clean");
            let all_green = !checks.is_empty() && checks.iter().all(|c| c.is_success());

            if clean && all_green {
                tracing::info!(repo, number, attempt, "pull request is green");
                return Ok(true);
            }

            tracing::debug!(
                repo,
                number,
                attempt,
                clean,
                checks = checks.len(),
                "pull request not green yet"
            );

            if attempt < self.cfg.poll_max_attempts {
                tokio::time::sleep(interval).await;
                if self.cfg.poll_backoff {
                    interval = (interval * 2)
                        .min(Duration::from_millis(self.cfg.poll_max_interval_ms));
                }
            }
        }

        Ok(false)
    }

    /// Squash-merge once green; otherwise report why the merge was skipped.
    pub async fn merge_if_green(&self, repo: &str, number: u64) -> Result<MergeOutcome, RunError> {
        if !self.wait_for_green(repo, number).await? {
            return Ok(MergeOutcome::skipped("CI not green"));
        }

        let merged = self
            .host
            .merge_pull_squash(repo, number)
            .await
            .map_err(RunError::Host)?;
        if merged {
            Ok(MergeOutcome::merged())
        } else {
            Ok(MergeOutcome::skipped("host declined the merge"))
        }
    }

    /// Require passing status checks on the default branch. Safe to
    /// re-apply.
    pub async fn protect_main_branch(&self, repo: &str) -> Result<(), RunError> {
        self.host
            .protect_branch(repo, &self.default_branch)
            .await
            .map_err(RunError::Host)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::execution::types::CheckRun;

    use super::*;

    #[derive(Default)]
    struct MockState {
        branches: HashMap<String, String>,
        pulls: Vec<PullRequest>,
        checks: Vec<CheckRun>,
        mergeable_state: Option<String>,
        create_ref_calls: u32,
        create_pull_calls: u32,
        merge_calls: u32,
    }

    struct MockHost {
        state: Mutex<MockState>,
    }

    impl MockHost {
        fn new() -> Self {
            let mut state = MockState::default();
            state.branches.insert("main".into(), "abc123".into());
            Self {
                state: Mutex::new(state),
            }
        }

        fn with_pr(mergeable_state: &str, checks: Vec<CheckRun>) -> Self {
            let host = Self::new();
            {
                let mut s = host.state.lock().unwrap();
                s.pulls.push(PullRequest {
                    number: 7,
                    state: "open".into(),
                    merged: false,
                    mergeable_state: Some(mergeable_state.into()),
                    head_sha: "feedbee".into(),
                    head_ref: "task/x".into(),
                    html_url: "https://host/pr/7".into(),
                });
                s.mergeable_state = Some(mergeable_state.into());
                s.checks = checks;
            }
            host
        }
    }

    #[async_trait]
    impl HostApi for MockHost {
        async fn get_repo(&self, _repo: &str) -> anyhow::Result<Option<Value>> {
            Ok(Some(json!({"name": "demo"})))
        }

        async fn create_repo(&self, _repo: &str, _description: &str) -> anyhow::Result<Value> {
            Ok(json!({}))
        }

        async fn enable_pages(&self, _repo: &str, _branch: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn get_ref_sha(&self, _repo: &str, branch: &str) -> anyhow::Result<Option<String>> {
            Ok(self.state.lock().unwrap().branches.get(branch).cloned())
        }

        async fn create_ref(&self, _repo: &str, branch: &str, sha: &str) -> anyhow::Result<()> {
            let mut s = self.state.lock().unwrap();
            s.create_ref_calls += 1;
            s.branches.insert(branch.to_string(), sha.to_string());
            Ok(())
        }

        async fn get_file_sha(
            &self,
            _repo: &str,
            _branch: &str,
            _path: &str,
        ) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        async fn put_file(
            &self,
            _repo: &str,
            _branch: &str,
            _path: &str,
            _content: &str,
            _message: &str,
            _sha: Option<&str>,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn list_open_pulls(
            &self,
            _repo: &str,
            head: &str,
            _base: &str,
        ) -> anyhow::Result<Vec<PullRequest>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .pulls
                .iter()
                .filter(|p| p.head_ref == head && p.state == "open")
                .cloned()
                .collect())
        }

        async fn create_pull(
            &self,
            _repo: &str,
            head: &str,
            _base: &str,
            _title: &str,
            _body: &str,
        ) -> anyhow::Result<PullRequest> {
            let mut s = self.state.lock().unwrap();
            s.create_pull_calls += 1;
            let pr = PullRequest {
                number: 100 + u64::from(s.create_pull_calls),
                state: "open".into(),
                merged: false,
                mergeable_state: s.mergeable_state.clone(),
                head_sha: "feedbee".into(),
                head_ref: head.to_string(),
                html_url: format!("https://host/pr/{}", 100 + s.create_pull_calls),
            };
            s.pulls.push(pr.clone());
            Ok(pr)
        }

        async fn get_pull(&self, _repo: &str, number: u64) -> anyhow::Result<PullRequest> {
            self.state
                .lock()
                .unwrap()
                .pulls
                .iter()
                .find(|p| p.number == number)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("pull request {number} not found"))
        }

        async fn merge_pull_squash(&self, _repo: &str, _number: u64) -> anyhow::Result<bool> {
            self.state.lock().unwrap().merge_calls += 1;
            Ok(true)
        }

        async fn list_check_runs(&self, _repo: &str, _sha: &str) -> anyhow::Result<Vec<CheckRun>> {
            Ok(self.state.lock().unwrap().checks.clone())
        }

        async fn protect_branch(&self, _repo: &str, _branch: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn fast_cfg() -> ExecutionConfig {
        ExecutionConfig {
            poll_max_attempts: 2,
            poll_interval_ms: 1,
            ..ExecutionConfig::default()
        }
    }

    fn executor(host: &Arc<MockHost>) -> HostExecutor {
        HostExecutor::new(host.clone() as Arc<dyn HostApi>, fast_cfg(), "acme", "main")
    }

    fn check(conclusion: Option<&str>) -> CheckRun {
        CheckRun {
            name: "ci".into(),
            status: "completed".into(),
            conclusion: conclusion.map(String::from),
        }
    }

    #[tokio::test]
    async fn ensure_branch_is_idempotent() {
        let host = Arc::new(MockHost::new());
        let ex = executor(&host);

        ex.ensure_branch_from("demo", "main", "task/a").await.unwrap();
        ex.ensure_branch_from("demo", "main", "task/a").await.unwrap();

        assert_eq!(host.state.lock().unwrap().create_ref_calls, 1);
    }

    #[tokio::test]
    async fn missing_base_branch_is_an_error() {
        let host = Arc::new(MockHost::new());
        let ex = executor(&host);
        assert!(ex
            .ensure_branch_from("demo", "nope", "task/a")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn open_pull_request_deduplicates() {
        let host = Arc::new(MockHost::new());
        let ex = executor(&host);

        let first = ex
            .open_pull_request("demo", "task/a", "main", "t", "b")
            .await
            .unwrap();
        let second = ex
            .open_pull_request("demo", "task/a", "main", "t", "b")
            .await
            .unwrap();

        assert_eq!(first.number, second.number);
        assert_eq!(host.state.lock().unwrap().create_pull_calls, 1);
    }

    #[tokio::test]
    async fn wait_for_green_requires_check_runs() {
        // Clean mergeable state with an empty check-run list is not green.
        let host = Arc::new(MockHost::with_pr("clean", vec![]));
        let ex = executor(&host);
        assert!(!ex.wait_for_green("demo", 7).await.unwrap());
    }

    #[tokio::test]
    async fn wait_for_green_requires_all_success() {
        let host = Arc::new(MockHost::with_pr(
            "clean",
            vec![check(Some("success")), check(Some("failure"))],
        ));
        let ex = executor(&host);
        assert!(!ex.wait_for_green("demo", 7).await.unwrap());
    }

    #[tokio::test]
    async fn wait_for_green_succeeds_when_clean_and_green() {
        let host = Arc::new(MockHost::with_pr(
            "clean",
            vec![check(Some("success")), check(Some("success"))],
        ));
        let ex = executor(&host);
        assert!(ex.wait_for_green("demo", 7).await.unwrap());
    }

    #[tokio::test]
    async fn wait_for_green_exhausts_attempts() {
        let host = Arc::new(MockHost::with_pr("blocked", vec![check(Some("success"))]));
        let ex = executor(&host);
        assert!(!ex.wait_for_green("demo", 7).await.unwrap());
    }

    #[tokio::test]
    async fn merge_if_green_reports_skip_reason() {
        let host = Arc::new(MockHost::with_pr("clean", vec![]));
        let ex = executor(&host);
        let outcome = ex.merge_if_green("demo", 7).await.unwrap();
        assert!(!outcome.merged);
        assert_eq!(outcome.reason.as_deref(), Some("CI not green"));
        assert_eq!(host.state.lock().unwrap().merge_calls, 0);
    }

    #[tokio::test]
    async fn merge_if_green_squash_merges() {
        let host = Arc::new(MockHost::with_pr("clean", vec![check(Some("success"))]));
        let ex = executor(&host);
        let outcome = ex.merge_if_green("demo", 7).await.unwrap();
        assert!(outcome.merged);
        assert_eq!(host.state.lock().unwrap().merge_calls, 1);
    }
}
