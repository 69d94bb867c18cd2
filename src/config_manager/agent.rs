use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config_manager::stateless_llm::StatelessLLMConfigs;

/// Settings for the XML validator agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Reject well-formed XML whose root is not `AlteryxDocument`
    #[serde(rename = "require_alteryx_root")]
    #[serde(default)]
    pub require_alteryx_root: bool,

    /// Ask the hosted model for a second opinion after the local parse succeeds
    #[serde(rename = "llm_review")]
    #[serde(default)]
    pub llm_review: bool,

    #[serde(rename = "max_summary_elements")]
    #[serde(default = "default_max_summary_elements")]
    pub max_summary_elements: usize,
}

fn default_max_summary_elements() -> usize {
    50
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            require_alteryx_root: false,
            llm_review: false,
            max_summary_elements: default_max_summary_elements(),
        }
    }
}

/// Backoff settings for hosted-model calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max_attempts")]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(rename = "initial_backoff_ms")]
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(rename = "max_backoff_ms")]
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Configuration for the agent pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(rename = "llm_provider")]
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String, // "gemini_llm", "vertex_ai_llm", "openai_compatible_llm"

    /// Answer non-XML messages with the hosted model instead of a fixed greeting
    #[serde(rename = "chatbot_enabled")]
    #[serde(default)]
    pub chatbot_enabled: bool,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(rename = "llm_configs")]
    #[serde(default)]
    pub llm_configs: StatelessLLMConfigs,
}

fn default_llm_provider() -> String {
    "gemini_llm".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            llm_provider: default_llm_provider(),
            chatbot_enabled: false,
            validator: ValidatorConfig::default(),
            retry: RetryConfig::default(),
            llm_configs: StatelessLLMConfigs::default(),
        }
    }
}
