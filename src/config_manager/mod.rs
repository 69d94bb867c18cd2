pub mod agent;
pub mod stateless_llm;
pub mod system;
pub mod utils;

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use agent::{AgentConfig, RetryConfig, ValidatorConfig};
pub use stateless_llm::{GeminiConfig, OpenAICompatibleConfig, StatelessLLMConfigs, VertexAIConfig};
pub use system::SystemConfig;

/// Main configuration for the application (YAML or JSON-LD)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "system_config")]
    #[serde(default)]
    pub system_config: SystemConfig,

    #[serde(rename = "agent_config")]
    #[serde(default)]
    pub agent_config: AgentConfig,
}

impl Config {
    /// Load configuration from a YAML or JSON-LD file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        utils::read_config(path.as_ref())
    }

    /// Try the usual config locations in order and return the first that loads.
    pub fn discover() -> Result<(Self, PathBuf)> {
        let candidates = candidate_paths();

        for path in &candidates {
            match Config::load(path) {
                Ok(config) => return Ok((config, path.clone())),
                Err(e) => {
                    debug!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }

        anyhow::bail!("Could not find config file. Tried: {:?}", candidates)
    }

    /// Apply deployment-time overrides (`PORT`, `GOOGLE_GENAI_USE_VERTEXAI`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            info!("Port overridden by environment: {}", port);
            self.system_config.port = port;
        }

        let use_vertex = lookup("GOOGLE_GENAI_USE_VERTEXAI")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if use_vertex {
            info!("GOOGLE_GENAI_USE_VERTEXAI set, using vertex_ai_llm");
            self.agent_config.llm_provider = "vertex_ai_llm".to_string();
        }
    }

    /// Check that the selected provider has a configuration block.
    pub fn validate(&self) -> Result<()> {
        let agent = &self.agent_config;
        let configs = &agent.llm_configs;
        let present = match agent.llm_provider.as_str() {
            "gemini_llm" => configs.gemini_llm.is_some(),
            "vertex_ai_llm" => configs.vertex_ai_llm.is_some(),
            "openai_compatible_llm" => configs.openai_compatible_llm.is_some(),
            other => anyhow::bail!("Unsupported LLM provider: {}", other),
        };
        if !present {
            anyhow::bail!(
                "Configuration not found for LLM provider: {}",
                agent.llm_provider
            );
        }
        if agent.retry.max_attempts == 0 {
            anyhow::bail!("agent_config.retry.max_attempts must be at least 1");
        }
        Ok(())
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    [
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from),
        Some(PathBuf::from("conf.yaml")),
        Some(PathBuf::from("conf.jsonld")),
        Some(exe_dir.join("conf.yaml")),
        Some(exe_dir.join("conf.jsonld")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_manager::utils::{parse_config, ConfigFormat};

    const SAMPLE: &str = r#"
system_config:
  host: 0.0.0.0
  port: 8080
agent_config:
  llm_provider: gemini_llm
  chatbot_enabled: true
  validator:
    require_alteryx_root: true
  llm_configs:
    gemini_llm:
      api_key: test-key
    vertex_ai_llm:
      project: demo
      location: us-central1
      access_token: token
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = parse_config(SAMPLE, ConfigFormat::Yaml).unwrap();
        assert!(config.agent_config.chatbot_enabled);
        assert!(config.agent_config.validator.require_alteryx_root);
        assert_eq!(config.agent_config.validator.max_summary_elements, 50);
        assert_eq!(config.agent_config.retry.max_attempts, 3);

        let gemini = config.agent_config.llm_configs.gemini_llm.as_ref().unwrap();
        assert_eq!(gemini.model, "gemini-2.0-flash");
        assert_eq!(gemini.base_url, "https://generativelanguage.googleapis.com/v1beta");
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_port_and_provider() {
        let mut config = parse_config(SAMPLE, ConfigFormat::Yaml).unwrap();
        config.apply_env_overrides(|name| match name {
            "PORT" => Some("9999".to_string()),
            "GOOGLE_GENAI_USE_VERTEXAI" => Some("TRUE".to_string()),
            _ => None,
        });
        assert_eq!(config.system_config.port, 9999);
        assert_eq!(config.agent_config.llm_provider, "vertex_ai_llm");
        config.validate().unwrap();
    }

    #[test]
    fn missing_provider_block_fails_validation() {
        let mut config = parse_config(SAMPLE, ConfigFormat::Yaml).unwrap();
        config.agent_config.llm_provider = "openai_compatible_llm".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("openai_compatible_llm"));
    }

    #[test]
    fn unknown_provider_fails_validation() {
        let mut config = Config::default();
        config.agent_config.llm_provider = "llama_cpp_llm".to_string();
        assert!(config.validate().is_err());
    }
}
