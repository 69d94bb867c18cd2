//! Google Gemini, either through the Generative Language API or Vertex AI.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::http::read_json;
use super::retry::RetryPolicy;
use super::stateless_llm_interface::{LlmError, Message, Role, StatelessLLMInterface};
use crate::config_manager::{GeminiConfig, VertexAIConfig};

/// How requests are addressed and authenticated
#[derive(Debug, Clone)]
enum Endpoint {
    /// `{base_url}/models/{model}:generateContent`, key in `x-goog-api-key`
    ApiKey { base_url: String, api_key: String },
    /// `{base_url}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent`
    Vertex {
        base_url: String,
        project: String,
        location: String,
        access_token: String,
    },
}

pub struct GeminiLLM {
    client: reqwest::Client,
    endpoint: Endpoint,
    model: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    retry: RetryPolicy,
}

impl GeminiLLM {
    pub fn new(config: &GeminiConfig, client: reqwest::Client) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() || config.api_key.starts_with("${") {
            return Err(LlmError::Configuration(
                "gemini_llm.api_key is not set (GOOGLE_API_KEY)".to_string(),
            ));
        }
        info!(
            "Initialized GeminiLLM: model={}, base_url={}",
            config.model, config.base_url
        );
        Ok(Self {
            client,
            endpoint: Endpoint::ApiKey {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            },
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            retry: RetryPolicy::default(),
        })
    }

    pub fn new_vertex(config: &VertexAIConfig, client: reqwest::Client) -> Result<Self, LlmError> {
        for (field, value) in [
            ("project", &config.project),
            ("location", &config.location),
            ("access_token", &config.access_token),
        ] {
            if value.trim().is_empty() || value.starts_with("${") {
                return Err(LlmError::Configuration(format!(
                    "vertex_ai_llm.{} is not set",
                    field
                )));
            }
        }
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.location));
        info!(
            "Initialized GeminiLLM (Vertex AI): model={}, project={}, location={}",
            config.model, config.project, config.location
        );
        Ok(Self {
            client,
            endpoint: Endpoint::Vertex {
                base_url: base_url.trim_end_matches('/').to_string(),
                project: config.project.clone(),
                location: config.location.clone(),
                access_token: config.access_token.clone(),
            },
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_request_body(&self, messages: &[Message], system: Option<&str>) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{"text": msg.content}],
                })
            })
            .collect();

        let mut generation_config = serde_json::Map::new();
        generation_config.insert("temperature".into(), self.temperature.into());
        if let Some(max) = self.max_output_tokens {
            generation_config.insert("maxOutputTokens".into(), max.into());
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if let (Some(sys), Some(obj)) = (system, body.as_object_mut()) {
            obj.insert(
                "systemInstruction".into(),
                serde_json::json!({"parts": [{"text": sys}]}),
            );
        }
        body
    }

    fn request(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        match &self.endpoint {
            Endpoint::ApiKey { base_url, api_key } => {
                let url = format!("{}/models/{}:generateContent", base_url, self.model);
                self.client
                    .post(url)
                    .header("x-goog-api-key", api_key)
                    .json(body)
            }
            Endpoint::Vertex {
                base_url,
                project,
                location,
                access_token,
            } => {
                let url = format!(
                    "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                    base_url, project, location, self.model
                );
                self.client.post(url).bearer_auth(access_token).json(body)
            }
        }
    }

    async fn generate_once(&self, body: &serde_json::Value) -> Result<String, LlmError> {
        let resp = self.request(body).send().await?;
        let data: GeminiResponse = read_json(resp).await?;

        let candidate = data
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            debug!(model = %self.model, finish_reason = reason, "Gemini candidate finished");
        }

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl StatelessLLMInterface for GeminiLLM {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat_completion(
        &self,
        messages: &[Message],
        system: Option<&str>,
    ) -> Result<String, LlmError> {
        let body = self.build_request_body(messages, system);
        debug!(model = %self.model, "Gemini generateContent");
        self.retry.execute(|| self.generate_once(&body)).await
    }
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gemini() -> GeminiLLM {
        let config = GeminiConfig {
            base_url: "https://example.test/v1beta/".to_string(),
            api_key: "key".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.5,
            max_output_tokens: Some(2048),
        };
        GeminiLLM::new(&config, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn request_body_maps_roles_and_system() {
        let body = gemini().build_request_body(
            &[Message::user("hi"), Message::assistant("hello")],
            Some("be brief"),
        );
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]},
                ],
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 2048},
                "systemInstruction": {"parts": [{"text": "be brief"}]},
            })
        );
    }

    #[test]
    fn unresolved_api_key_is_rejected() {
        let config = GeminiConfig {
            base_url: "https://example.test".to_string(),
            api_key: "${GOOGLE_API_KEY}".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            max_output_tokens: None,
        };
        assert!(matches!(
            GeminiLLM::new(&config, reqwest::Client::new()),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn vertex_defaults_to_regional_endpoint() {
        let config = VertexAIConfig {
            project: "demo".to_string(),
            location: "europe-west1".to_string(),
            access_token: "token".to_string(),
            base_url: None,
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            max_output_tokens: None,
        };
        let llm = GeminiLLM::new_vertex(&config, reqwest::Client::new()).unwrap();
        match llm.endpoint {
            Endpoint::Vertex { base_url, .. } => {
                assert_eq!(base_url, "https://europe-west1-aiplatform.googleapis.com")
            }
            other => panic!("unexpected endpoint: {other:?}"),
        }
    }
}
