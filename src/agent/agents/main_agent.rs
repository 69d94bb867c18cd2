use tracing::{debug, info};

use super::chatbot_agent::ChatbotAgent;
use super::sql_generator_agent::SqlGeneratorAgent;
use super::validator_agent::{ValidationOutcome, ValidatorAgent};
use crate::agent::output_types::AgentReply;
use crate::agent::stateless_llm::LlmError;

pub const GREETING: &str =
    "Hello! I can answer your questions or help convert Alteryx XML to BigQuery SQL.";

pub const INVALID_XML_REPLY: &str = "Invalid XML format. Please check the structure.";

/// Routes a chat message: XML goes through validation and SQL generation,
/// anything else gets a conversational answer.
pub struct MainAgent {
    validator: ValidatorAgent,
    sql_generator: SqlGeneratorAgent,
    /// `None` means non-XML messages get the fixed greeting
    chatbot: Option<ChatbotAgent>,
}

impl MainAgent {
    pub fn new(
        validator: ValidatorAgent,
        sql_generator: SqlGeneratorAgent,
        chatbot: Option<ChatbotAgent>,
    ) -> Self {
        Self {
            validator,
            sql_generator,
            chatbot,
        }
    }

    /// Model used by the pipeline
    pub fn model_id(&self) -> &str {
        self.sql_generator.model_id()
    }

    pub fn chatbot_enabled(&self) -> bool {
        self.chatbot.is_some()
    }

    pub fn is_xml(input: &str) -> bool {
        let trimmed = strip_input(input);
        trimmed.starts_with('<') && trimmed.ends_with('>')
    }

    pub async fn handle_input(&self, input_text: &str) -> Result<AgentReply, LlmError> {
        if Self::is_xml(input_text) {
            info!("MainAgent: routing {} bytes of XML to validator", input_text.len());
            return match self.validator.validate(strip_input(input_text)).await? {
                ValidationOutcome::Valid(workflow) => self.sql_generator.generate_sql(&workflow).await,
                ValidationOutcome::Invalid(e) => Ok(AgentReply::invalid_xml(INVALID_XML_REPLY, e.to_string())),
            };
        }

        match &self.chatbot {
            Some(chatbot) if !strip_input(input_text).is_empty() => {
                debug!("MainAgent: routing message to chatbot");
                Ok(AgentReply::chat(chatbot.reply(input_text).await?))
            }
            _ => Ok(AgentReply::chat(GREETING)),
        }
    }
}

/// Trim whitespace and a leading byte order mark (pasted `.yxmd` files often carry one)
fn strip_input(input: &str) -> &str {
    input.trim().trim_start_matches('\u{feff}').trim_start()
}
