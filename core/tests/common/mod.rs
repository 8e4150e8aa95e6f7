//! Shared stubs for end-to-end coordinator scenarios: static capability
//! plugins and a call-recording host.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use autoforge_core::api::{
    CheckRun, CoderPlugin, Commit, FileEdit, HostApi, Patch, PlannerPlugin, PullRequest,
    PullRequestSpec, Task, TestFile, Verdict, VerdictStatus, VerifierPlugin,
};

pub struct StaticPlanner {
    pub tasks: Vec<Task>,
}

#[async_trait]
impl PlannerPlugin for StaticPlanner {
    async fn plan(
        &self,
        _objective: &str,
        _constraints: Option<&Value>,
    ) -> anyhow::Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }
}

/// Produces one single-file commit per task on a `task/{id}` branch.
pub struct TemplateCoder;

#[async_trait]
impl CoderPlugin for TemplateCoder {
    async fn code(&self, _objective: &str, task: &Task) -> anyhow::Result<Patch> {
        Ok(Patch {
            branch: format!("task/{}", task.id),
            commits: vec![Commit {
                message: format!("feat: {}", task.description),
                files: vec![FileEdit {
                    path: format!("src/{}.rs", task.id.replace('-', "_")),
                    content: format!("// {}\n", task.description),
                }],
            }],
            pr: PullRequestSpec {
                title: task.description.clone(),
                body: format!("Implements task {}", task.id),
            },
        })
    }
}

/// Passes every task except the ids listed in `fail_ids`.
#[derive(Default)]
pub struct SelectiveVerifier {
    pub fail_ids: HashSet<String>,
    pub with_tests: bool,
}

#[async_trait]
impl VerifierPlugin for SelectiveVerifier {
    async fn verify(&self, task: &Task, _patch: &Patch) -> anyhow::Result<Verdict> {
        let status = if self.fail_ids.contains(&task.id) {
            VerdictStatus::Fail
        } else {
            VerdictStatus::Pass
        };
        let test_files = if self.with_tests && status == VerdictStatus::Pass {
            vec![TestFile {
                path: format!("tests/{}.rs", task.id.replace('-', "_")),
                content: "#[test]\nfn generated() {}\n".into(),
            }]
        } else {
            vec![]
        };
        Ok(Verdict { status, test_files })
    }
}

#[derive(Default)]
pub struct HostState {
    pub repos: HashSet<String>,
    pub branches: HashMap<String, String>,
    pub pulls: Vec<PullRequest>,
    pub checks: Vec<CheckRun>,
    pub mergeable_state: String,
    pub calls: Vec<String>,
}

/// In-memory host that records every call it receives.
pub struct RecordingHost {
    pub state: Mutex<HostState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        let mut state = HostState {
            mergeable_state: "clean".to_string(),
            ..HostState::default()
        };
        state.branches.insert("main".into(), "base000".into());
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn green() -> Self {
        let host = Self::new();
        host.state.lock().unwrap().checks = vec![CheckRun {
            name: "ci".into(),
            status: "completed".into(),
            conclusion: Some("success".into()),
        }];
        host
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl HostApi for RecordingHost {
    async fn get_repo(&self, repo: &str) -> anyhow::Result<Option<Value>> {
        self.record(format!("get_repo {repo}"));
        let known = self.state.lock().unwrap().repos.contains(repo);
        Ok(known.then(|| json!({"name": repo})))
    }

    async fn create_repo(&self, repo: &str, _description: &str) -> anyhow::Result<Value> {
        self.record(format!("create_repo {repo}"));
        self.state.lock().unwrap().repos.insert(repo.to_string());
        Ok(json!({"name": repo}))
    }

    async fn enable_pages(&self, repo: &str, _branch: &str) -> anyhow::Result<()> {
        self.record(format!("enable_pages {repo}"));
        Ok(())
    }

    async fn get_ref_sha(&self, _repo: &str, branch: &str) -> anyhow::Result<Option<String>> {
        self.record(format!("get_ref_sha {branch}"));
        Ok(self.state.lock().unwrap().branches.get(branch).cloned())
    }

    async fn create_ref(&self, _repo: &str, branch: &str, sha: &str) -> anyhow::Result<()> {
        self.record(format!("create_ref {branch}"));
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn get_file_sha(
        &self,
        _repo: &str,
        _branch: &str,
        path: &str,
    ) -> anyhow::Result<Option<String>> {
        self.record(format!("get_file_sha {path}"));
        Ok(None)
    }

    async fn put_file(
        &self,
        _repo: &str,
        branch: &str,
        path: &str,
        _content: &str,
        _message: &str,
        _sha: Option<&str>,
    ) -> anyhow::Result<()> {
        self.record(format!("put_file {branch} {path}"));
        Ok(())
    }

    async fn list_open_pulls(
        &self,
        _repo: &str,
        head: &str,
        _base: &str,
    ) -> anyhow::Result<Vec<PullRequest>> {
        self.record(format!("list_open_pulls {head}"));
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
        self.record(format!("create_pull {head}"));
        let mut state = self.state.lock().unwrap();
        let number = state.pulls.len() as u64 + 1;
        let pr = PullRequest {
            number,
            state: "open".into(),
            merged: false,
            mergeable_state: Some(state.mergeable_state.clone()),
            head_sha: format!("sha-{head}"),
            head_ref: head.to_string(),
            html_url: format!("https://host/pulls/{number}"),
        };
        state.pulls.push(pr.clone());
        Ok(pr)
    }

    async fn get_pull(&self, _repo: &str, number: u64) -> anyhow::Result<PullRequest> {
        self.record(format!("get_pull {number}"));
        self.state
            .lock()
            .unwrap()
            .pulls
            .iter()
            .find(|p| p.number == number)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("pull request {number} not found"))
    }

    async fn merge_pull_squash(&self, _repo: &str, number: u64) -> anyhow::Result<bool> {
        self.record(format!("merge_pull {number}"));
        let mut state = self.state.lock().unwrap();
        if let Some(pr) = state.pulls.iter_mut().find(|p| p.number == number) {
            pr.merged = true;
            pr.state = "closed".into();
        }
        Ok(true)
    }

    async fn list_check_runs(&self, _repo: &str, sha: &str) -> anyhow::Result<Vec<CheckRun>> {
        self.record(format!("list_check_runs {sha}"));
        Ok(self.state.lock().unwrap().checks.clone())
    }

    async fn protect_branch(&self, repo: &str, branch: &str) -> anyhow::Result<()> {
        self.record(format!("protect_branch {repo} {branch}"));
        Ok(())
    }
}
