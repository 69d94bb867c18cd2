use std::sync::Arc;

use anyhow::Context;

use crate::agent::agent_factory::AgentFactory;
use crate::agent::agents::MainAgent;
use crate::agent::stateless_llm::http::build_client;
use crate::config_manager::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agent: Arc<MainAgent>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = build_client(config.system_config.request_timeout())
            .context("Failed to build HTTP client")?;
        let agent = AgentFactory::create_agent(&config.agent_config, client)?;
        Ok(Self::with_agent(config, agent))
    }

    pub fn with_agent(config: Config, agent: MainAgent) -> Self {
        Self {
            config: Arc::new(config),
            agent: Arc::new(agent),
        }
    }
}
