use anyhow::Result;
use tracing::info;

use crate::agent::agents::{ChatbotAgent, MainAgent, SqlGeneratorAgent, ValidatorAgent};
use crate::agent::stateless_llm::RetryPolicy;
use crate::agent::stateless_llm_factory::StatelessLLMFactory;
use crate::config_manager::AgentConfig;

/// Factory for the agent pipeline
pub struct AgentFactory;

impl AgentFactory {
    /// Build the main agent and its sub-agents from configuration.
    ///
    /// All agents share one LLM client for the configured provider.
    ///
    /// # Arguments
    /// * `agent_config` - Provider choice, validator settings, retry policy and LLM configs
    /// * `client` - Shared HTTP client
    pub fn create_agent(agent_config: &AgentConfig, client: reqwest::Client) -> Result<MainAgent> {
        info!("Initializing agent pipeline with provider: {}", agent_config.llm_provider);

        let llm = StatelessLLMFactory::create_llm(
            &agent_config.llm_provider,
            &agent_config.llm_configs,
            RetryPolicy::from(&agent_config.retry),
            client,
        )?;

        let validator = ValidatorAgent::new(agent_config.validator.clone(), llm.clone());
        let sql_generator = SqlGeneratorAgent::new(llm.clone())?;
        let chatbot = agent_config
            .chatbot_enabled
            .then(|| ChatbotAgent::new(llm));

        Ok(MainAgent::new(validator, sql_generator, chatbot))
    }
}
