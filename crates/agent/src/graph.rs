//! The conversation graph: a small state machine over one turn.
//!
//! ```text
//! QueryOrRespond ──(tool call)──▶ Tools ──▶ Generate ──▶ Done
//!        │
//!        └──(direct answer)──────────────────────────▶ Done
//! ```
//!
//! Each node reads the message list, appends what it produced and names
//! the next node. [`ConversationGraph::run`] drives the machine to `Done`;
//! the streaming engine drives it one [`ConversationGraph::step`] at a
//! time so it can report progress between nodes.

use crate::classifier::needs_retrieval;
use crate::context::select_context;
use crate::prompt::enterprise_prompt;
use ragwise_config::AppConfig;
use ragwise_core::error::{Error, ToolError};
use ragwise_core::message::{Message, Role, latest_user_message};
use ragwise_core::provider::{Provider, ProviderRequest};
use ragwise_core::tool::{ToolCall, ToolRegistry};
use ragwise_retrieval::extract_filters;
use ragwise_tools::{RETRIEVE, RETRIEVE_WITH_FILTERS};
use std::sync::Arc;
use tracing::{debug, warn};

/// A node of the conversation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    QueryOrRespond,
    Tools,
    Generate,
    Done,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::QueryOrRespond => "query_or_respond",
            Node::Tools => "tools",
            Node::Generate => "generate",
            Node::Done => "done",
        }
    }
}

/// The value threaded through the graph: the thread's full history.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub messages: Vec<Message>,
}

impl GraphState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Decoding parameters for one kind of model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoding {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
}

/// Everything the graph needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub model: String,
    /// Used for the routing call in `QueryOrRespond`.
    pub routing: Decoding,
    /// Used for the grounded answer in `Generate`.
    pub generation: Decoding,
    pub context_chars: usize,
    pub current_year: i32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            model: "mistral-small-2506".into(),
            routing: Decoding {
                temperature: 0.3,
                top_p: 0.9,
                max_tokens: None,
            },
            generation: Decoding {
                temperature: 0.3,
                top_p: 0.85,
                max_tokens: Some(512),
            },
            context_chars: 5000,
            current_year: 2024,
        }
    }
}

impl GraphSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        Self {
            model: config.provider.model.clone(),
            routing: defaults.routing,
            generation: Decoding {
                temperature: config.generation.temperature,
                top_p: config.generation.top_p,
                max_tokens: Some(config.generation.max_tokens),
            },
            context_chars: config.generation.context_chars,
            current_year: config.retrieval.current_year,
        }
    }
}

/// Fallback question used by `Generate` when the history holds no user turn.
const NO_QUESTION: &str = "No question found";

/// The conversation graph over a provider and the retrieval tools.
pub struct ConversationGraph {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    settings: GraphSettings,
}

impl ConversationGraph {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, settings: GraphSettings) -> Self {
        Self {
            provider,
            tools,
            settings,
        }
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    fn request(&self, messages: Vec<Message>, decoding: Decoding) -> ProviderRequest {
        let mut request = ProviderRequest::new(self.settings.model.clone(), messages);
        request.temperature = decoding.temperature;
        request.top_p = Some(decoding.top_p);
        request.max_tokens = decoding.max_tokens;
        request
    }

    /// Run one node and return the next one.
    pub async fn step(&self, node: Node, mut state: GraphState) -> Result<(Node, GraphState), Error> {
        debug!(node = node.name(), messages = state.messages.len(), "Graph step");

        let next = match node {
            Node::QueryOrRespond => self.query_or_respond(&mut state).await?,
            Node::Tools => self.tools(&mut state).await,
            Node::Generate => self.generate(&mut state).await?,
            Node::Done => Node::Done,
        };

        Ok((next, state))
    }

    /// Drive the graph from `QueryOrRespond` until `Done`.
    pub async fn run(&self, mut state: GraphState) -> Result<GraphState, Error> {
        let mut node = Node::QueryOrRespond;
        while node != Node::Done {
            (node, state) = self.step(node, state).await?;
        }
        Ok(state)
    }

    async fn query_or_respond(&self, state: &mut GraphState) -> Result<Node, Error> {
        let latest = latest_user_message(&state.messages);
        let Some(latest) = latest.filter(|m| needs_retrieval(m)) else {
            debug!("Answering directly");
            let request = self.request(state.messages.clone(), self.settings.routing);
            let response = self.provider.complete(request).await?;
            state.messages.push(response.message);
            return Ok(Node::Done);
        };

        let filters = extract_filters(&latest.content, self.settings.current_year);
        let tool_name = if filters.is_empty() {
            RETRIEVE
        } else {
            RETRIEVE_WITH_FILTERS
        };
        let definition = self
            .tools
            .definition(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        debug!(tool = tool_name, ?filters, "Binding retrieval tool");

        let request = self
            .request(state.messages.clone(), self.settings.routing)
            .with_tools(vec![definition]);
        let response = self.provider.complete(request).await?;
        let wants_tools = response.message.has_tool_calls();
        state.messages.push(response.message);

        Ok(if wants_tools { Node::Tools } else { Node::Done })
    }

    async fn tools(&self, state: &mut GraphState) -> Node {
        let calls = state
            .messages
            .last()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        for tc in calls {
            let call = ToolCall {
                id: tc.id.clone(),
                name: tc.name.clone(),
                arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
            };

            let content = match self.tools.execute(&call).await {
                Ok(result) => result.output,
                Err(e) => {
                    warn!(tool = %tc.name, error = %e, "Tool call failed");
                    format!("Error: {e}")
                }
            };
            state.messages.push(Message::tool_result(tc.id, content));
        }

        Node::Generate
    }

    async fn generate(&self, state: &mut GraphState) -> Result<Node, Error> {
        let passages: Vec<&str> = state
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.content.as_str())
            .collect();

        if passages.is_empty() {
            debug!("No tool output to generate from");
            return Ok(Node::Done);
        }

        let question = latest_user_message(&state.messages)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| NO_QUESTION.to_string());
        let context = select_context(&passages, &question, self.settings.context_chars);

        let messages = vec![
            Message::system(enterprise_prompt(&context, &question)),
            Message::user(question),
        ];
        let response = self
            .provider
            .complete(self.request(messages, self.settings.generation))
            .await?;
        state.messages.push(response.message);

        Ok(Node::Done)
    }
}
