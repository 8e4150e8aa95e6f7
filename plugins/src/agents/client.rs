use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use autoforge_core::api::{
    AgentServiceConfig, CoderPlugin, Patch, PlannerPlugin, Task, Verdict, VerifierPlugin,
};

/// HTTP client for the agent service hosting the planning, coding and
/// verification capabilities. One client implements all three plugin
/// traits; clone it into each slot.
#[derive(Clone)]
pub struct AgentServiceClient {
    api_key: String,
    http: reqwest::Client,
    // Pre-built endpoints, one per capability
    url_plan: String,
    url_code: String,
    url_verify: String,
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    tasks: Vec<Task>,
}

impl AgentServiceClient {
    pub fn new(cfg: &AgentServiceConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            api_key: cfg.api_key.clone(),
            http,
            url_plan: format!("{}/v1/agents/plan", normalized),
            url_code: format!("{}/v1/agents/code", normalized),
            url_verify: format!("{}/v1/agents/verify", normalized),
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    async fn post(&self, url: &str, payload: &Value) -> anyhow::Result<Value> {
        let req = self.http.post(url).json(payload);
        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("agent service unreachable at {url}: {err}"))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| anyhow::anyhow!("agent service body read failed at {url}: {err}"))?;
        if !status.is_success() {
            anyhow::bail!(
                "agent service error at {url}: status={} body={}",
                status.as_u16(),
                super::preview(&body)
            );
        }
        serde_json::from_str(&body).map_err(|err| {
            anyhow::anyhow!(
                "agent service returned malformed json at {url}: {err} | body={}",
                super::preview(&body)
            )
        })
    }
}

#[async_trait]
impl PlannerPlugin for AgentServiceClient {
    async fn plan(
        &self,
        objective: &str,
        constraints: Option<&Value>,
    ) -> anyhow::Result<Vec<Task>> {
        tracing::debug!(
            target: "autoforge.agents",
            stage = "plan.in",
            objective_len = objective.len()
        );
        let payload = json!({
            "objective": objective,
            "constraints": constraints.cloned().unwrap_or(Value::Null),
        });
        let v = self.post(&self.url_plan, &payload).await?;
        let resp: PlanResponse = serde_json::from_value(v)?;
        tracing::debug!(
            target: "autoforge.agents",
            stage = "plan.out",
            tasks = resp.tasks.len()
        );
        Ok(resp.tasks)
    }
}

#[async_trait]
impl CoderPlugin for AgentServiceClient {
    async fn code(&self, objective: &str, task: &Task) -> anyhow::Result<Patch> {
        tracing::debug!(
            target: "autoforge.agents",
            stage = "code.in",
            task_id = task.id.as_str()
        );
        let payload = json!({"objective": objective, "task": task});
        let v = self.post(&self.url_code, &payload).await?;
        let patch: Patch = serde_json::from_value(v)?;
        tracing::debug!(
            target: "autoforge.agents",
            stage = "code.out",
            task_id = task.id.as_str(),
            branch = patch.branch.as_str(),
            commits = patch.commits.len()
        );
        Ok(patch)
    }
}

#[async_trait]
impl VerifierPlugin for AgentServiceClient {
    async fn verify(&self, task: &Task, patch: &Patch) -> anyhow::Result<Verdict> {
        tracing::debug!(
            target: "autoforge.agents",
            stage = "verify.in",
            task_id = task.id.as_str()
        );
        let payload = json!({"task": task, "patch": patch});
        let v = self.post(&self.url_verify, &payload).await?;
        let verdict: Verdict = serde_json::from_value(v)?;
        tracing::debug!(
            target: "autoforge.agents",
            stage = "verify.out",
            task_id = task.id.as_str(),
            status = ?verdict.status
        );
        Ok(verdict)
    }
}
