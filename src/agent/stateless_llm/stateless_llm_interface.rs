use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Failure talking to a hosted model
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited by provider")]
    RateLimited,

    /// Never carries the request URL
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }
}

impl LlmError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Network(_) => true,
            Self::Api { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Interface for a stateless language model
/// Stateless means the LLM doesn't store memory, system prompts, or user messages
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Model identifier, e.g. `gemini-2.0-flash`
    fn model_id(&self) -> &str;

    /// Run one completion over `messages` and return the full response text
    async fn chat_completion(
        &self,
        messages: &[Message],
        system: Option<&str>,
    ) -> Result<String, LlmError>;
}
