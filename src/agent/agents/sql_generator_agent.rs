use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use super::validator_agent::ValidatedWorkflow;
use crate::agent::output_types::AgentReply;
use crate::agent::stateless_llm::{LlmError, Message, StatelessLLMInterface};
use crate::utils::text::{strip_code_fences, truncate_chars};

const SYSTEM_PROMPT: &str = "You are an expert Alteryx and BigQuery SQL developer. \
You convert Alteryx workflow XML into functional BigQuery Standard SQL.";

const CONVERSION_ERROR_PREFIX: &str = "Conversion Error:";

/// Asks the hosted model to turn a validated workflow into BigQuery SQL
pub struct SqlGeneratorAgent {
    llm: Arc<dyn StatelessLLMInterface>,
    sql_start: Regex,
}

impl SqlGeneratorAgent {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>) -> anyhow::Result<Self> {
        info!("SqlGeneratorAgent initialized with model {}", llm.model_id());
        Ok(Self {
            llm,
            sql_start: Regex::new(r"(?i)^(SELECT|WITH|CREATE|INSERT|MERGE)\b")?,
        })
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    pub async fn generate_sql(&self, workflow: &ValidatedWorkflow) -> Result<AgentReply, LlmError> {
        let prompt = build_prompt(workflow);
        info!(
            tools = workflow.tools.len(),
            "SqlGenerator: calling model for SQL generation"
        );
        let raw = self
            .llm
            .chat_completion(&[Message::user(prompt)], Some(SYSTEM_PROMPT))
            .await?;
        Ok(self.classify(&raw))
    }

    /// Turn raw model output into an SQL reply or a conversion error
    pub fn classify(&self, raw: &str) -> AgentReply {
        let text = strip_code_fences(raw);

        if self.sql_start.is_match(&text) {
            return AgentReply::sql(text);
        }

        if text
            .to_ascii_uppercase()
            .starts_with(&CONVERSION_ERROR_PREFIX.to_ascii_uppercase())
        {
            info!("SqlGenerator: model declined the conversion");
            return AgentReply::conversion_error(text);
        }

        warn!(
            "SqlGenerator: model did not return SQL. Raw response start: {}",
            truncate_chars(&text, 100)
        );
        AgentReply::conversion_error(format!(
            "{} The AI model could not generate valid BigQuery SQL from the provided Alteryx XML. \
             Please review the XML. Raw AI response: {}",
            CONVERSION_ERROR_PREFIX, text
        ))
    }
}

fn build_prompt(workflow: &ValidatedWorkflow) -> String {
    let mut prompt = String::from(
        "Convert the provided Alteryx XML backend code into a functional BigQuery Standard SQL query.\n\
         Focus on the main data flow and transformations (e.g., Input Data, Select, Filter, Join, Union, Output Data).\n\
         Infer table names, column names, and data types where necessary from the context of the Alteryx XML.\n\
         Assume the source tables for Alteryx Input Data tools exist in BigQuery.\n",
    );

    if !workflow.tools.is_empty() {
        prompt.push_str("\nTools in this workflow (ToolID: plugin):\n");
        for tool in &workflow.tools {
            prompt.push_str(&format!(
                "- {}: {}\n",
                tool.tool_id,
                tool.short_plugin().unwrap_or("unknown")
            ));
        }
    }

    if !workflow.connections.is_empty() {
        prompt.push_str("\nConnections (origin -> destination):\n");
        for connection in &workflow.connections {
            prompt.push_str(&format!("- {}\n", connection));
        }
    }

    if !workflow.summary.is_empty() {
        prompt.push_str("\nSimplified representation:\n");
        prompt.push_str(&workflow.summary.join("\n"));
        prompt.push('\n');
    }

    prompt.push_str("\nHere is the Alteryx XML backend code:\n\n```xml\n");
    prompt.push_str(&workflow.xml);
    prompt.push_str("\n```\n\n");
    prompt.push_str(
        "Based on this Alteryx XML, generate the corresponding BigQuery SQL.\n\
         If the XML represents multiple distinct data flows, generate one comprehensive SQL query or multiple queries as appropriate.\n\
         Do NOT include any explanations, preambles, or conversational text. Just provide the SQL code.\n\
         If the XML is clearly not a valid Alteryx workflow or too complex/malformed to convert, \
         provide a concise error message starting with \"Conversion Error:\" instead of SQL.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::agents::validator_agent::parse_workflow;
    use crate::agent::output_types::ReplyKind;
    use crate::agent::testing::{ScriptedLLM, WORKFLOW};

    fn agent(responses: &[&str]) -> (SqlGeneratorAgent, Arc<ScriptedLLM>) {
        let llm = ScriptedLLM::new(responses.iter().copied());
        (SqlGeneratorAgent::new(llm.clone()).unwrap(), llm)
    }

    #[test]
    fn prompt_lists_tools_connections_and_xml() {
        let workflow = parse_workflow(WORKFLOW, 50).unwrap();
        let prompt = build_prompt(&workflow);
        assert!(prompt.contains("- 1: DbFileInput"));
        assert!(prompt.contains("- 2: Filter"));
        assert!(prompt.contains("- 1.Output -> 2.Input"));
        assert!(prompt.contains("```xml\n<?xml"));
        assert!(prompt.contains("\"Conversion Error:\""));
    }

    #[test]
    fn classifies_sql_with_fences() {
        let (agent, _) = agent(&[]);
        let reply = agent.classify("```sql\nWITH t AS (SELECT 1) SELECT * FROM t\n```");
        assert_eq!(reply.kind, ReplyKind::Sql);
        assert_eq!(reply.text, "WITH t AS (SELECT 1) SELECT * FROM t");
    }

    #[test]
    fn keeps_model_conversion_error() {
        let (agent, _) = agent(&[]);
        let reply = agent.classify("conversion error: no input tools found");
        assert_eq!(reply.kind, ReplyKind::ConversionError);
        assert_eq!(reply.text, "conversion error: no input tools found");
    }

    #[test]
    fn wraps_unexpected_output() {
        let (agent, _) = agent(&[]);
        let reply = agent.classify("Sure, here you go");
        assert_eq!(reply.kind, ReplyKind::ConversionError);
        assert!(reply.text.starts_with("Conversion Error:"));
        assert!(reply.text.ends_with("Raw AI response: Sure, here you go"));
    }

    #[test]
    fn keyword_must_be_a_whole_word() {
        let (agent, _) = agent(&[]);
        assert_eq!(agent.classify("SELECTION of tools").kind, ReplyKind::ConversionError);
    }

    #[tokio::test]
    async fn generates_sql_from_model_output() {
        let (agent, llm) = agent(&["```sql\nSELECT * FROM sales.orders WHERE amount > 100\n```"]);
        let workflow = parse_workflow(WORKFLOW, 50).unwrap();
        let reply = agent.generate_sql(&workflow).await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Sql);
        assert_eq!(reply.text, "SELECT * FROM sales.orders WHERE amount > 100");
        assert_eq!(llm.calls(), 1);
        assert!(llm.last_prompt().unwrap().contains("sales.orders"));
    }
}
