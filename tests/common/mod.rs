//! Shared test helpers: configs pointing at a mock server and canned model replies.
#![allow(dead_code)]

use alteryx_sql_backend::agent::stateless_llm::RetryPolicy;
use alteryx_sql_backend::config_manager::{
    AgentConfig, Config, GeminiConfig, RetryConfig, StatelessLLMConfigs, SystemConfig,
};
use serde_json::json;
use std::time::Duration;

pub const WORKFLOW: &str = r#"<?xml version="1.0"?>
<AlteryxDocument yxmdVer="2020.1">
  <Nodes>
    <Node ToolID="1">
      <GuiSettings Plugin="AlteryxBasePluginsGui.DbFileInput.DbFileInput" />
      <Properties><Configuration><File>sales.orders</File></Configuration></Properties>
    </Node>
    <Node ToolID="2">
      <GuiSettings Plugin="AlteryxBasePluginsGui.Filter.Filter" />
      <Properties><Configuration><Expression>[amount] &gt; 100</Expression></Configuration></Properties>
    </Node>
  </Nodes>
  <Connections>
    <Connection>
      <Origin ToolID="1" Connection="Output" />
      <Destination ToolID="2" Connection="Input" />
    </Connection>
  </Connections>
</AlteryxDocument>"#;

pub const GEMINI_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

pub fn gemini_config(server_uri: &str) -> GeminiConfig {
    GeminiConfig {
        base_url: format!("{}/v1beta", server_uri),
        api_key: "test-key".to_string(),
        model: "gemini-2.0-flash".to_string(),
        temperature: 0.2,
        max_output_tokens: None,
    }
}

/// Full service config using Gemini at `server_uri`
pub fn app_config(server_uri: &str, chatbot_enabled: bool) -> Config {
    Config {
        system_config: SystemConfig {
            max_message_bytes: 64 * 1024,
            ..SystemConfig::default()
        },
        agent_config: AgentConfig {
            llm_provider: "gemini_llm".to_string(),
            chatbot_enabled,
            retry: RetryConfig {
                max_attempts: 2,
                initial_backoff_ms: 1,
                max_backoff_ms: 1,
            },
            llm_configs: StatelessLLMConfigs {
                gemini_llm: Some(gemini_config(server_uri)),
                ..StatelessLLMConfigs::default()
            },
            ..AgentConfig::default()
        },
    }
}

/// A `generateContent` response with a single text candidate
pub fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 10,
            "candidatesTokenCount": 5,
            "totalTokenCount": 15
        }
    })
}
