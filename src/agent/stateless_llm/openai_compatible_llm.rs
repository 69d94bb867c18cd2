use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::http::read_json;
use super::retry::RetryPolicy;
use super::stateless_llm_interface::{LlmError, Message, Role, StatelessLLMInterface};
use crate::config_manager::OpenAICompatibleConfig;

/// OpenAI compatible LLM implementation (`/chat/completions`)
pub struct OpenAICompatibleLLM {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAICompatibleLLM {
    pub fn new(config: &OpenAICompatibleConfig, client: reqwest::Client) -> Self {
        info!(
            "Initialized OpenAICompatibleLLM: model={}, base_url={}",
            config.model, config.base_url
        );
        Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            temperature: config.temperature,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_request_body(&self, messages: &[Message], system: Option<&str>) -> serde_json::Value {
        let mut service_messages = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system {
            service_messages.push(serde_json::json!({"role": "system", "content": sys}));
        }

        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            service_messages.push(serde_json::json!({"role": role, "content": msg.content}));
        }

        serde_json::json!({
            "model": self.model,
            "messages": service_messages,
            "temperature": self.temperature,
        })
    }

    async fn complete_once(&self, body: &serde_json::Value) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let data: ChatCompletionResponse = read_json(resp).await?;

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat_completion(
        &self,
        messages: &[Message],
        system: Option<&str>,
    ) -> Result<String, LlmError> {
        let body = self.build_request_body(messages, system);
        debug!(model = %self.model, "OpenAI-compatible chat completion");
        self.retry.execute(|| self.complete_once(&body)).await
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
