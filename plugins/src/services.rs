//! ServicesFactory implementation: builds the host and capability clients
//! from configuration, for the CLI to wire into run coordinators.

use std::sync::Arc;

use async_trait::async_trait;

use autoforge_core::api::{AppConfig, RunError, Services, ServicesFactory};

use crate::agents::AgentServiceClient;
use crate::github::GithubClient;

pub struct PluginServicesFactory;

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunError> {
        let host = GithubClient::new(&cfg.github)
            .map_err(|e| RunError::Config(format!("github client: {e}")))?;
        let agents = Arc::new(
            AgentServiceClient::new(&cfg.agents)
                .map_err(|e| RunError::Config(format!("agent service client: {e}")))?,
        );

        Ok(Services {
            planner: agents.clone(),
            coder: agents.clone(),
            verifier: agents,
            host: Arc::new(host),
        })
    }
}
