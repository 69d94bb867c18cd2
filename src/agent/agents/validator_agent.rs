//! Well-formedness and structure checks for Alteryx workflow XML.

use std::fmt;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent::stateless_llm::{LlmError, Message, StatelessLLMInterface};
use crate::config_manager::ValidatorConfig;
use crate::utils::text::truncate_chars;

const ALTERYX_ROOT: &str = "AlteryxDocument";

const REVIEW_SYSTEM_PROMPT: &str = "You review Alteryx workflow XML before it is converted to BigQuery SQL. \
Answer on the first line with exactly VALID if the document is an Alteryx workflow that describes a data flow, \
or INVALID: <short reason> otherwise. Do not add anything else.";

/// One tool (`<Node ToolID=..>`) of the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNode {
    pub tool_id: String,
    /// `GuiSettings/@Plugin`, e.g. `AlteryxBasePluginsGui.Filter.Filter`
    pub plugin: Option<String>,
}

impl ToolNode {
    /// Last segment of the plugin name (`Filter`, `DbFileInput`, ...)
    pub fn short_plugin(&self) -> Option<&str> {
        self.plugin
            .as_deref()
            .map(|p| p.rsplit('.').next().unwrap_or(p))
    }
}

/// Edge between two tool anchors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub origin_tool: String,
    pub origin_anchor: Option<String>,
    pub destination_tool: String,
    pub destination_anchor: Option<String>,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin_tool)?;
        if let Some(anchor) = &self.origin_anchor {
            write!(f, ".{}", anchor)?;
        }
        write!(f, " -> {}", self.destination_tool)?;
        if let Some(anchor) = &self.destination_anchor {
            write!(f, ".{}", anchor)?;
        }
        Ok(())
    }
}

/// A well-formed document plus what could be read out of it
#[derive(Debug, Clone)]
pub struct ValidatedWorkflow {
    pub xml: String,
    pub root_tag: String,
    pub tools: Vec<ToolNode>,
    pub connections: Vec<Connection>,
    /// Simplified view: `<Tag> text` or `<Tag k="v">`, capped in length
    pub summary: Vec<String>,
}

impl ValidatedWorkflow {
    pub fn is_alteryx(&self) -> bool {
        self.root_tag == ALTERYX_ROOT
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("text outside the root element: {0:?}")]
    TextOutsideRoot(String),

    #[error("more than one root element (<{first}> and <{second}>)")]
    MultipleRoots { first: String, second: String },

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedEnd { expected: String, found: String },

    #[error("closing tag </{0}> has no matching opening tag")]
    UnmatchedEnd(String),

    #[error("document contains no elements")]
    Empty,

    #[error("root element <{0}> is not an AlteryxDocument")]
    NotAlteryx(String),

    #[error("rejected by model review: {0}")]
    Rejected(String),
}

#[derive(Debug)]
pub enum ValidationOutcome {
    Valid(ValidatedWorkflow),
    Invalid(ValidationError),
}

pub struct ValidatorAgent {
    config: ValidatorConfig,
    llm: Arc<dyn StatelessLLMInterface>,
}

impl ValidatorAgent {
    pub fn new(config: ValidatorConfig, llm: Arc<dyn StatelessLLMInterface>) -> Self {
        info!(
            "ValidatorAgent initialized (require_alteryx_root={}, llm_review={})",
            config.require_alteryx_root, config.llm_review
        );
        Self { config, llm }
    }

    /// Validate `xml`. `Err` only when the optional model review could not be run.
    pub async fn validate(&self, xml: &str) -> Result<ValidationOutcome, LlmError> {
        let workflow = match parse_workflow(xml, self.config.max_summary_elements) {
            Ok(workflow) => workflow,
            Err(e) => {
                warn!("Validator: {}", e);
                return Ok(ValidationOutcome::Invalid(e));
            }
        };

        if self.config.require_alteryx_root && !workflow.is_alteryx() {
            let e = ValidationError::NotAlteryx(workflow.root_tag.clone());
            warn!("Validator: {}", e);
            return Ok(ValidationOutcome::Invalid(e));
        }

        debug!(
            root = %workflow.root_tag,
            tools = workflow.tools.len(),
            connections = workflow.connections.len(),
            "Validator: XML is well-formed"
        );

        if self.config.llm_review {
            if let Some(reason) = self.review(&workflow).await? {
                let e = ValidationError::Rejected(reason);
                warn!("Validator: {}", e);
                return Ok(ValidationOutcome::Invalid(e));
            }
        }

        Ok(ValidationOutcome::Valid(workflow))
    }

    /// Returns the rejection reason, if the model rejected the document
    async fn review(&self, workflow: &ValidatedWorkflow) -> Result<Option<String>, LlmError> {
        let prompt = format!("```xml\n{}\n```", workflow.xml);
        let answer = self
            .llm
            .chat_completion(&[Message::user(prompt)], Some(REVIEW_SYSTEM_PROMPT))
            .await?;
        Ok(parse_review(&answer))
    }
}

fn parse_review(answer: &str) -> Option<String> {
    let first_line = answer.trim().lines().next().unwrap_or("").trim();
    let upper = first_line.to_ascii_uppercase();

    if upper.starts_with("INVALID") {
        let reason = first_line["INVALID".len()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .to_string();
        return Some(if reason.is_empty() {
            "no reason given".to_string()
        } else {
            reason
        });
    }
    if !upper.starts_with("VALID") {
        warn!(
            "Validator: unexpected review answer, accepting document: {}",
            truncate_chars(first_line, 100)
        );
    }
    None
}

/// Parse `xml`, enforcing a single root and balanced tags, and collect tools,
/// connections and a summary of at most `max_summary` lines.
pub fn parse_workflow(xml: &str, max_summary: usize) -> Result<ValidatedWorkflow, ValidationError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ParseState::new(max_summary);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(reader.buffer_position() as u64, e))?;
        let position = reader.buffer_position() as u64;

        match event {
            Event::Start(e) => {
                let name = tag_name(&e);
                let attrs = read_attributes(&e, position)?;
                state.open_root(&name)?;
                state.on_element(&name, &attrs);
                state.stack.push(name);
            }
            Event::Empty(e) => {
                let name = tag_name(&e);
                let attrs = read_attributes(&e, position)?;
                state.open_root(&name)?;
                state.on_element(&name, &attrs);
                state.on_close(&name);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match state.stack.pop() {
                    Some(open) if open == name => state.on_close(&name),
                    Some(open) => {
                        return Err(ValidationError::MismatchedEnd {
                            expected: open,
                            found: name,
                        })
                    }
                    None => return Err(ValidationError::UnmatchedEnd(name)),
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| malformed(position, e))?;
                state.on_text(&text)?;
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                state.on_text(&text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no data flow
            _ => {}
        }
    }

    if let Some(open) = state.stack.pop() {
        return Err(ValidationError::Unclosed(open));
    }
    let root_tag = state.root.take().ok_or(ValidationError::Empty)?;

    Ok(ValidatedWorkflow {
        xml: xml.to_string(),
        root_tag,
        tools: state.tools,
        connections: state.connections,
        summary: state.summary,
    })
}

#[derive(Default)]
struct PendingConnection {
    origin: Option<(String, Option<String>)>,
    destination: Option<(String, Option<String>)>,
}

struct ParseState {
    stack: Vec<String>,
    root: Option<String>,
    tools: Vec<ToolNode>,
    /// One entry per open `<Node>`: its index into `tools`, if it had a ToolID
    open_nodes: Vec<Option<usize>>,
    connections: Vec<Connection>,
    pending_connection: Option<PendingConnection>,
    summary: Vec<String>,
    max_summary: usize,
}

impl ParseState {
    fn new(max_summary: usize) -> Self {
        Self {
            stack: Vec::new(),
            root: None,
            tools: Vec::new(),
            open_nodes: Vec::new(),
            connections: Vec::new(),
            pending_connection: None,
            summary: Vec::new(),
            max_summary,
        }
    }

    fn open_root(&mut self, name: &str) -> Result<(), ValidationError> {
        if !self.stack.is_empty() {
            return Ok(());
        }
        match &self.root {
            Some(first) => Err(ValidationError::MultipleRoots {
                first: first.clone(),
                second: name.to_string(),
            }),
            None => {
                self.root = Some(name.to_string());
                Ok(())
            }
        }
    }

    fn on_element(&mut self, name: &str, attrs: &[(String, String)]) {
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        match name {
            "Node" => {
                let idx = attr("ToolID").map(|tool_id| {
                    self.tools.push(ToolNode {
                        tool_id,
                        plugin: None,
                    });
                    self.tools.len() - 1
                });
                self.open_nodes.push(idx);
            }
            "GuiSettings" => {
                let current = self.open_nodes.last().copied().flatten();
                if let (Some(idx), Some(plugin)) = (current, attr("Plugin")) {
                    let tool = &mut self.tools[idx];
                    if tool.plugin.is_none() {
                        tool.plugin = Some(plugin);
                    }
                }
            }
            "Connection" => {
                self.pending_connection = Some(PendingConnection::default());
            }
            "Origin" | "Destination" => {
                if let (Some(pending), Some(tool_id)) =
                    (self.pending_connection.as_mut(), attr("ToolID"))
                {
                    let end = Some((tool_id, attr("Connection")));
                    if name == "Origin" {
                        pending.origin = end;
                    } else {
                        pending.destination = end;
                    }
                }
            }
            _ => {}
        }

        if !attrs.is_empty() {
            let rendered: Vec<String> = attrs
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, v))
                .collect();
            self.push_summary(format!("<{} {}>", name, rendered.join(" ")));
        }
    }

    fn on_close(&mut self, name: &str) {
        match name {
            "Node" => {
                self.open_nodes.pop();
            }
            "Connection" => {
                if let Some(PendingConnection {
                    origin: Some((origin_tool, origin_anchor)),
                    destination: Some((destination_tool, destination_anchor)),
                }) = self.pending_connection.take()
                {
                    self.connections.push(Connection {
                        origin_tool,
                        origin_anchor,
                        destination_tool,
                        destination_anchor,
                    });
                }
            }
            _ => {}
        }
    }

    fn on_text(&mut self, text: &str) -> Result<(), ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        match self.stack.last() {
            None => Err(ValidationError::TextOutsideRoot(truncate_chars(text, 40))),
            Some(tag) => {
                let line = format!("<{}> {}", tag, truncate_chars(text, 200));
                self.push_summary(line);
                Ok(())
            }
        }
    }

    fn push_summary(&mut self, line: String) {
        if self.summary.len() < self.max_summary {
            self.summary.push(line);
        }
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn read_attributes(
    e: &BytesStart<'_>,
    position: u64,
) -> Result<Vec<(String, String)>, ValidationError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(position, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(position, err))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn malformed(position: u64, err: impl fmt::Display) -> ValidationError {
    ValidationError::Malformed {
        position,
        message: err.to_string(),
    }
}
