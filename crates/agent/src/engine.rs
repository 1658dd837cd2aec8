//! The engine: the entry point the gateway and CLI talk to.
//!
//! A turn loads the thread from the checkpoint store, appends the user
//! message, drives the conversation graph to `Done` and writes the final
//! state back. Nothing is saved for a turn that fails.

use crate::dedup::StreamDeduplicator;
use crate::graph::{ConversationGraph, GraphSettings, GraphState, Node};
use crate::stream_event::{StreamEvent, StreamStatus};
use crate::thread_memory::ThreadMemory;
use ragwise_config::AppConfig;
use ragwise_core::error::Error;
use ragwise_core::memory::CheckpointStore;
use ragwise_core::message::{Message, Role};
use ragwise_core::provider::Provider;
use ragwise_core::retrieval::VectorIndex;
use ragwise_retrieval::{CachedRetrievalClient, RetrievalCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Reply when a turn fails anywhere inside the graph.
pub const ERROR_REPLY: &str =
    "Sorry, I encountered an error while processing your request with our knowledge base.";

/// Reply when a turn finishes without any assistant message.
pub const NO_RESPONSE_REPLY: &str = "I apologize, but I couldn't generate a response. Please try again.";

/// Default upper bound on an inbound message, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

const STREAM_BUFFER: usize = 32;

/// Why an inbound message was rejected before reaching the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Message cannot be empty")]
    Empty,

    #[error("Message too long (max {max} characters)")]
    TooLong { max: usize, actual: usize },
}

/// Check an inbound message and return it trimmed.
pub fn validate_message(message: &str, max_chars: usize) -> Result<&str, InputError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let actual = trimmed.chars().count();
    if actual > max_chars {
        return Err(InputError::TooLong {
            max: max_chars,
            actual,
        });
    }
    Ok(trimmed)
}

enum StreamStop {
    /// The receiver went away.
    Closed,
    Failed(Error),
}

impl From<Error> for StreamStop {
    fn from(e: Error) -> Self {
        StreamStop::Failed(e)
    }
}

async fn emit(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<(), StreamStop> {
    tx.send(event).await.map_err(|_| StreamStop::Closed)
}

/// Retrieval-augmented conversation engine.
///
/// Cheap to clone; clones share the graph, cache and checkpoint store.
#[derive(Clone)]
pub struct RagEngine {
    graph: Arc<ConversationGraph>,
    memory: ThreadMemory,
    retrieval: CachedRetrievalClient,
    max_message_chars: usize,
}

impl RagEngine {
    pub fn new(graph: ConversationGraph, store: Arc<dyn CheckpointStore>, retrieval: CachedRetrievalClient) -> Self {
        Self {
            graph: Arc::new(graph),
            memory: ThreadMemory::new(store),
            retrieval,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    /// Wire an engine from configuration and its three collaborators.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        let cache = Arc::new(RetrievalCache::new(Duration::from_secs(config.retrieval.cache_ttl_secs)));
        let retrieval = CachedRetrievalClient::new(index, cache).with_fallback_k(config.retrieval.fallback_k);
        let tools = ragwise_tools::retrieval_registry(
            retrieval.clone(),
            config.retrieval.top_k,
            config.retrieval.filtered_top_k,
        );
        let graph = ConversationGraph::new(provider, tools, GraphSettings::from_config(config));

        Self::new(graph, store, retrieval).with_max_message_chars(config.gateway.max_message_chars)
    }

    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    pub fn max_message_chars(&self) -> usize {
        self.max_message_chars
    }

    /// The retrieval client shared with the graph's tools.
    pub fn retrieval(&self) -> &CachedRetrievalClient {
        &self.retrieval
    }

    pub fn settings(&self) -> &GraphSettings {
        self.graph.settings()
    }

    pub fn validate<'a>(&self, message: &'a str) -> Result<&'a str, InputError> {
        validate_message(message, self.max_message_chars)
    }

    /// Validate, then [`run`](Self::run).
    pub async fn chat(&self, message: &str, thread_id: &str) -> Result<Message, InputError> {
        let message = self.validate(message)?;
        Ok(self.run(message, thread_id).await)
    }

    /// Validate, then [`stream`](Self::stream).
    pub fn chat_stream(&self, message: &str, thread_id: &str) -> Result<mpsc::Receiver<StreamEvent>, InputError> {
        let message = self.validate(message)?;
        Ok(self.stream(message, thread_id))
    }

    /// Run one turn and return the assistant's reply. Never fails: errors
    /// become a fixed apology.
    pub async fn run(&self, message: &str, thread_id: &str) -> Message {
        info!(thread_id, "Turn started");
        match self.turn(message, thread_id).await {
            Ok(reply) => {
                info!(thread_id, chars = reply.content.len(), "Turn complete");
                reply
            }
            Err(e) => {
                error!(thread_id, error = %e, "Turn failed");
                Message::assistant(ERROR_REPLY)
            }
        }
    }

    async fn turn(&self, message: &str, thread_id: &str) -> Result<Message, Error> {
        let mut messages = self.load_history(thread_id).await?;
        let start = messages.len();
        messages.push(Message::user(message));

        let state = self.graph.run(GraphState::new(messages)).await?;
        self.commit(thread_id, &state).await;

        Ok(state
            .messages
            .iter()
            .skip(start)
            .rev()
            .find(|m| m.role == Role::Assistant)
            .cloned()
            .unwrap_or_else(|| Message::assistant(NO_RESPONSE_REPLY)))
    }

    /// Run one turn in the background, reporting progress over a channel.
    ///
    /// The stream always ends with a `complete` status or a single
    /// `error` event. Dropping the receiver abandons the turn at its
    /// next event.
    pub fn stream(&self, message: &str, thread_id: &str) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let engine = self.clone();
        let message = message.to_string();
        let thread_id = thread_id.to_string();

        tokio::spawn(async move {
            info!(thread_id = %thread_id, "Streamed turn started");
            match engine.stream_turn(&message, &thread_id, &tx).await {
                Ok(()) => info!(thread_id = %thread_id, "Streamed turn complete"),
                Err(StreamStop::Closed) => debug!(thread_id = %thread_id, "Stream receiver dropped"),
                Err(StreamStop::Failed(e)) => {
                    error!(thread_id = %thread_id, error = %e, "Streamed turn failed");
                    let _ = tx.send(StreamEvent::Error { error: e.to_string() }).await;
                }
            }
        });

        rx
    }

    async fn stream_turn(
        &self,
        message: &str,
        thread_id: &str,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), StreamStop> {
        emit(tx, StreamEvent::status(StreamStatus::Thinking)).await?;

        let mut messages = self.load_history(thread_id).await?;
        messages.push(Message::user(message));

        // Only messages produced by this turn are reported.
        let mut reported = messages.len();
        let mut dedup = StreamDeduplicator::new();
        let mut state = GraphState::new(messages);
        let mut node = Node::QueryOrRespond;

        while node != Node::Done {
            (node, state) = self.graph.step(node, state).await?;

            for msg in state.messages.iter().skip(reported) {
                match msg.role {
                    Role::Assistant => {
                        if let Some(content) = dedup.accept(&msg.content) {
                            emit(tx, StreamEvent::Content { content }).await?;
                        }
                    }
                    Role::Tool => {
                        emit(tx, StreamEvent::status(StreamStatus::SearchingKnowledgeBase)).await?;
                    }
                    Role::User | Role::System => {}
                }
            }
            reported = state.messages.len();
        }

        self.commit(thread_id, &state).await;
        emit(tx, StreamEvent::status(StreamStatus::Complete)).await
    }

    async fn load_history(&self, thread_id: &str) -> Result<Vec<Message>, Error> {
        Ok(self.memory.store().load(thread_id).await?.unwrap_or_default())
    }

    async fn commit(&self, thread_id: &str, state: &GraphState) {
        if let Err(e) = self.memory.store().save(thread_id, &state.messages).await {
            warn!(thread_id, error = %e, "Failed to save thread checkpoint");
        }
    }

    /// A thread's messages in order; empty when unknown or unreadable.
    pub async fn get_history(&self, thread_id: &str) -> Vec<Message> {
        self.memory.get(thread_id).await
    }

    /// Drop a thread's messages. `false` when the store refused.
    pub async fn clear_history(&self, thread_id: &str) -> bool {
        self.memory.clear(thread_id).await
    }
}
