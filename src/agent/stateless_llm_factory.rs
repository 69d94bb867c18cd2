use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::agent::stateless_llm::{
    GeminiLLM, OpenAICompatibleLLM, RetryPolicy, StatelessLLMInterface,
};
use crate::config_manager::StatelessLLMConfigs;

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Create an LLM based on the configuration.
    ///
    /// # Arguments
    /// * `llm_provider` - One of `gemini_llm`, `vertex_ai_llm`, `openai_compatible_llm`
    /// * `llm_configs` - Pool of provider configurations
    /// * `retry` - Backoff policy applied to every call
    /// * `client` - Shared HTTP client
    pub fn create_llm(
        llm_provider: &str,
        llm_configs: &StatelessLLMConfigs,
        retry: RetryPolicy,
        client: reqwest::Client,
    ) -> Result<Arc<dyn StatelessLLMInterface>> {
        info!("Initializing LLM: {}", llm_provider);

        let missing = || anyhow::anyhow!("Configuration not found for LLM provider: {}", llm_provider);

        match llm_provider {
            "gemini_llm" => {
                let config = llm_configs.gemini_llm.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(GeminiLLM::new(config, client)?.with_retry_policy(retry)))
            }
            "vertex_ai_llm" => {
                let config = llm_configs.vertex_ai_llm.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(
                    GeminiLLM::new_vertex(config, client)?.with_retry_policy(retry),
                ))
            }
            "openai_compatible_llm" => {
                let config = llm_configs.openai_compatible_llm.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(
                    OpenAICompatibleLLM::new(config, client).with_retry_policy(retry),
                ))
            }
            _ => Err(anyhow::anyhow!("Unsupported LLM provider: {}", llm_provider)),
        }
    }
}
