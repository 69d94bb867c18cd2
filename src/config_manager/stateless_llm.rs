use serde::{Deserialize, Serialize};

/// Configuration for the Gemini Generative Language API (API-key auth)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(rename = "api_key")]
    pub api_key: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(rename = "max_output_tokens")]
    pub max_output_tokens: Option<u32>,
}

/// Configuration for Gemini served through Vertex AI (OAuth bearer auth)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexAIConfig {
    pub project: String,

    pub location: String,

    /// Short-lived OAuth2 token, e.g. from `gcloud auth print-access-token`
    #[serde(rename = "access_token")]
    pub access_token: String,

    /// Overrides the regional `https://{location}-aiplatform.googleapis.com` endpoint
    pub base_url: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(rename = "max_output_tokens")]
    pub max_output_tokens: Option<u32>,
}

/// Configuration for OpenAI-compatible LLM providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    #[serde(rename = "base_url")]
    pub base_url: String,

    #[serde(rename = "llm_api_key")]
    pub llm_api_key: String,

    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

/// Pool of LLM provider configurations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatelessLLMConfigs {
    #[serde(rename = "gemini_llm")]
    pub gemini_llm: Option<GeminiConfig>,

    #[serde(rename = "vertex_ai_llm")]
    pub vertex_ai_llm: Option<VertexAIConfig>,

    #[serde(rename = "openai_compatible_llm")]
    pub openai_compatible_llm: Option<OpenAICompatibleConfig>,
}
