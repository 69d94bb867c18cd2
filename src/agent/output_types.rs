use serde::{Deserialize, Serialize};

/// What kind of answer the pipeline produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Conversational text, not a conversion
    Chat,
    /// BigQuery SQL produced from a workflow
    Sql,
    /// The message looked like XML but failed validation
    InvalidXml,
    /// The hosted model declined or produced something that is not SQL
    ConversionError,
}

/// Final answer of the agent pipeline for one chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub kind: ReplyKind,
    pub text: String,
    pub detail: Option<String>,
}

impl AgentReply {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Chat,
            text: text.into(),
            detail: None,
        }
    }

    pub fn sql(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Sql,
            text: text.into(),
            detail: None,
        }
    }

    pub fn invalid_xml(text: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::InvalidXml,
            text: text.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn conversion_error(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::ConversionError,
            text: text.into(),
            detail: None,
        }
    }
}
