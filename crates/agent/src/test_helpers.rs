//! Shared test helpers for graph and engine tests.

use ragwise_core::error::{ProviderError, RetrievalError};
use ragwise_core::message::{Message, MessageToolCall};
use ragwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ragwise_core::retrieval::{FilterSet, PassageMetadata, RetrievedPassage, VectorIndex};
use ragwise_core::tool::ToolRegistry;
use ragwise_retrieval::{CachedRetrievalClient, InMemoryIndex, RetrievalCache};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Create a provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, thought),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// Replays scripted responses in order, then fails every later call.
pub struct FailAfterProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    error: ProviderError,
}

impl FailAfterProvider {
    pub fn new(mut responses: Vec<ProviderResponse>, error: ProviderError) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            error,
        }
    }
}

#[async_trait::async_trait]
impl Provider for FailAfterProvider {
    fn name(&self) -> &str {
        "fail_after_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| self.error.clone())
    }
}

/// A vector index whose every search fails.
pub struct DownIndex;

#[async_trait::async_trait]
impl VectorIndex for DownIndex {
    fn name(&self) -> &str {
        "down"
    }

    async fn similarity_search(
        &self,
        _query: &str,
        _k: usize,
        _filter: Option<&FilterSet>,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        Err(RetrievalError::Unavailable("connection refused".into()))
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut response = make_text_response(thought);
    response.message.tool_calls = tool_calls;
    response
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{}", name),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

fn passage(title: &str, content: &str, department: &str, doc_type: &str, year: i32) -> RetrievedPassage {
    RetrievedPassage {
        content: content.into(),
        source: format!("kb/{}.md", title.to_lowercase().replace(' ', "_")),
        title: title.into(),
        metadata: PassageMetadata {
            department: Some(department.into()),
            doc_type: Some(doc_type.into()),
            year: Some(year),
            security_level: Some("Internal".into()),
            ..Default::default()
        },
    }
}

/// A retrieval client over a small fixed corpus.
pub fn seeded_client() -> CachedRetrievalClient {
    let index = InMemoryIndex::with_passages(vec![
        passage("Transformer Notes", "Attention layers in transformer models", "AI Research", "Research Paper", 2023),
        passage("Kubernetes Rollouts", "Blue-green deployments on the platform", "Platform", "System Design", 2022),
        passage("Feature Stores", "Serving features for machine learning", "ML Engineering", "Technical Guide", 2024),
    ]);
    CachedRetrievalClient::new(
        Arc::new(index),
        Arc::new(RetrievalCache::new(Duration::from_secs(300))),
    )
}

/// Both retrieval tools over [`seeded_client`].
pub fn seeded_registry() -> ToolRegistry {
    ragwise_tools::retrieval_registry(seeded_client(), 3, 3)
}
