use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::RunError;
use crate::events::{start_event_sink, EventSinkTx};
use crate::execution::HostApi;
use crate::pipeline::{CoderPlugin, PlannerPlugin, VerifierPlugin};

/// The pluggable capabilities one run needs.
#[derive(Clone)]
pub struct Services {
    pub planner: Arc<dyn PlannerPlugin>,
    pub coder: Arc<dyn CoderPlugin>,
    pub verifier: Arc<dyn VerifierPlugin>,
    pub host: Arc<dyn HostApi>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    event_sink: Option<EventSinkTx>,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub async fn new(
        cfg: AppConfig,
        services_factory: Option<Arc<dyn ServicesFactory>>,
    ) -> Result<Self, RunError> {
        let event_sink = start_event_sink(&cfg.events)
            .await
            .map_err(RunError::Config)?;
        Ok(Self {
            cfg,
            event_sink,
            services_factory,
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn event_sink(&self) -> Option<EventSinkTx> {
        self.event_sink.clone()
    }

    pub async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(RunError::Config(
                "services_factory missing (cannot build plugins/services)".into(),
            ));
        };
        factory.build_services(cfg).await
    }
}
