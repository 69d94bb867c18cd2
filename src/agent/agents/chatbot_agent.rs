use std::sync::Arc;

use tracing::info;

use crate::agent::stateless_llm::{LlmError, Message, StatelessLLMInterface};

const SYSTEM_PROMPT: &str = "You are a friendly assistant for general conversation. \
You can also convert Alteryx workflow XML into BigQuery SQL: when the user asks about that, \
tell them to paste the workflow XML (the .yxmd file contents) as their whole message. \
Keep answers short.";

/// Answers messages that are not workflow XML
pub struct ChatbotAgent {
    llm: Arc<dyn StatelessLLMInterface>,
}

impl ChatbotAgent {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>) -> Self {
        info!("ChatbotAgent initialized with model {}", llm.model_id());
        Self { llm }
    }

    pub async fn reply(&self, message: &str) -> Result<String, LlmError> {
        let text = self
            .llm
            .chat_completion(&[Message::user(message)], Some(SYSTEM_PROMPT))
            .await?;
        Ok(text.trim().to_string())
    }
}
