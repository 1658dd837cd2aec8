//! JSON API over the engine.
//!
//! Endpoints:
//!
//! - `POST   /chat`: Send a message, get the reply
//! - `POST   /chat/stream`: Send a message, get an SSE stream
//! - `POST   /retrieval`: Unfiltered knowledge-base search
//! - `POST   /retrieval/filter`: Search with explicit metadata filters
//! - `POST   /retrieval/enhance`: Search with filters extracted from the query
//! - `GET    /retrieval/analyze?query=`: Explain filter extraction for a query
//! - `GET    /conversation/{thread_id}`: Thread history
//! - `DELETE /conversation/{thread_id}`: Clear a thread

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use ragwise_agent::InputError;
use ragwise_core::retrieval::{Department, DocType};
use ragwise_retrieval::{RetrievalOutcome, analyze_filters, extract_filters, format};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::SharedState;

/// Build the API router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/retrieval", post(retrieval_handler))
        .route("/retrieval/filter", post(filtered_retrieval_handler))
        .route("/retrieval/enhance", post(enhanced_retrieval_handler))
        .route("/retrieval/analyze", get(analyze_handler))
        .route(
            "/conversation/{thread_id}",
            get(get_conversation_handler).delete(clear_conversation_handler),
        )
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

fn default_thread_id() -> String {
    "default".into()
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default = "default_thread_id")]
    thread_id: String,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct RetrievalRequest {
    query: String,
}

#[derive(Serialize, Deserialize)]
struct FilteredRetrievalRequest {
    query: String,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    year: Option<i32>,
}

#[derive(Deserialize)]
struct AnalyzeParams {
    query: String,
}

#[derive(Serialize, Deserialize)]
struct HistoryEntry {
    #[serde(rename = "type")]
    kind: String,
    content: String,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn invalid_input(e: InputError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e.to_string())
}

fn require_query(query: &str) -> Result<&str, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query cannot be empty"));
    }
    Ok(query)
}

const EXAMPLE_QUERIES: [&str; 5] = [
    "AI research papers from 2023",
    "ML engineering technical guides",
    "Data science best practices 2024",
    "System design documentation",
    "R&D technical reports from 2022",
];

/// First year offered as a filter suggestion.
const FIRST_SUGGESTED_YEAR: i32 = 2018;

// ── Chat ──────────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    info!(thread_id = %payload.thread_id, chars = payload.message.len(), "chat request");

    let reply = state
        .engine
        .chat(&payload.message, &payload.thread_id)
        .await
        .map_err(invalid_input)?;

    Ok(Json(ChatResponse {
        response: reply.content,
    }))
}

/// `POST /chat/stream`: Send a message, receive an SSE stream of events.
async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    info!(thread_id = %payload.thread_id, "chat/stream SSE request");

    let rx = state
        .engine
        .chat_stream(&payload.message, &payload.thread_id)
        .map_err(invalid_input)?;

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event.event_type()).data(data))
    });

    Ok(Sse::new(stream))
}

// ── Retrieval ─────────────────────────────────────────────────────────────

async fn retrieval_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RetrievalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = require_query(&payload.query)?;
    let results = state
        .engine
        .retrieval()
        .retrieve_formatted(query, state.config.retrieval.top_k, None)
        .await;

    Ok(Json(serde_json::json!({
        "success": true,
        "query": query,
        "results": results,
        "retrieval_type": "basic",
    })))
}

async fn filtered_retrieval_handler(
    State(state): State<SharedState>,
    Json(payload): Json<FilteredRetrievalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = require_query(&payload.query)?;
    let requested = serde_json::json!({
        "department": payload.department,
        "doc_type": payload.doc_type,
        "year": payload.year,
    });
    let filters = ragwise_tools::filters_from_arguments(&requested);

    let results = state
        .engine
        .retrieval()
        .retrieve_formatted(query, state.config.retrieval.filtered_top_k, Some(&filters))
        .await;

    Ok(Json(serde_json::json!({
        "success": true,
        "query": query,
        "filters": requested,
        "applied_filters": filters,
        "results": results,
        "retrieval_type": "filtered",
    })))
}

async fn enhanced_retrieval_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RetrievalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = require_query(&payload.query)?;
    let filters = extract_filters(query, state.engine.settings().current_year);

    let outcome = state
        .engine
        .retrieval()
        .retrieve(query, state.config.retrieval.enhanced_top_k, Some(&filters))
        .await;

    let found = |results: String, count: usize| {
        serde_json::json!({
            "success": true,
            "query": query,
            "extracted_filters": filters,
            "results_count": count,
            "results": results,
            "retrieval_type": "enhanced",
        })
    };

    let body = match outcome {
        RetrievalOutcome::Found(passages) => found(format::full(&passages), passages.len()),
        RetrievalOutcome::Degraded(passages) => found(format::fallback(&passages), passages.len()),
        RetrievalOutcome::Unavailable => serde_json::json!({
            "success": false,
            "error": format::SEARCH_UNAVAILABLE,
            "query": query,
            "extracted_filters": filters,
            "retrieval_type": "enhanced",
        }),
    };

    Ok(Json(body))
}

async fn analyze_handler(
    State(state): State<SharedState>,
    Query(params): Query<AnalyzeParams>,
) -> Json<serde_json::Value> {
    let current_year = state.engine.settings().current_year;
    let filters = extract_filters(&params.query, current_year);
    let analysis = analyze_filters(&params.query);

    let departments: Vec<&str> = Department::ALL.iter().map(|d| d.as_str()).collect();
    let doc_types: Vec<&str> = DocType::ALL.iter().map(|d| d.as_str()).collect();
    let years: Vec<i32> = (FIRST_SUGGESTED_YEAR..=current_year).collect();

    Json(serde_json::json!({
        "success": true,
        "query": params.query,
        "extracted_filters": filters,
        "analysis": analysis,
        "suggested_filters": {
            "available_departments": departments,
            "available_doc_types": doc_types,
            "available_years": years,
            "example_queries_with_filters": EXAMPLE_QUERIES,
        },
    }))
}

// ── Conversations ─────────────────────────────────────────────────────────

async fn get_conversation_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
) -> Json<Vec<HistoryEntry>> {
    let history = state.engine.get_history(&thread_id).await;
    Json(
        history
            .into_iter()
            .map(|m| HistoryEntry {
                kind: m.role.as_str().to_string(),
                content: m.content,
            })
            .collect(),
    )
}

async fn clear_conversation_handler(
    State(state): State<SharedState>,
    Path(thread_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.engine.clear_history(&thread_id).await {
        info!(thread_id = %thread_id, "Conversation cleared");
        Ok(Json(serde_json::json!({ "message": "Conversation cleared" })))
    } else {
        Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to clear conversation",
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{GatewayState, SharedState};
    use ragwise_agent::RagEngine;
    use ragwise_config::AppConfig;
    use ragwise_core::error::ProviderError;
    use ragwise_core::memory::CheckpointStore;
    use ragwise_core::message::Message;
    use ragwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use ragwise_core::retrieval::{PassageMetadata, RetrievedPassage};
    use ragwise_memory::InMemoryCheckpointer;
    use ragwise_retrieval::InMemoryIndex;
    use std::sync::{Arc, Mutex};

    /// Replays scripted replies, then answers with a fixed text.
    pub struct ScriptedProvider {
        replies: Mutex<Vec<ProviderResponse>>,
    }

    impl ScriptedProvider {
        pub fn new(mut replies: Vec<ProviderResponse>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let next = self.replies.lock().unwrap().pop();
            Ok(next.unwrap_or_else(|| text_response("Mock response from agent")))
        }
    }

    pub fn text_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "mock-model".into(),
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

    pub fn test_state_with(replies: Vec<ProviderResponse>, store: Arc<dyn CheckpointStore>) -> SharedState {
        let config = AppConfig::default();
        let index = InMemoryIndex::with_passages(vec![
            passage("Transformer Notes", "Attention layers in transformer models", "AI Research", "Research Paper", 2023),
            passage("Kubernetes Rollouts", "Blue-green deployments on the platform", "Platform", "System Design", 2022),
            passage("Feature Stores", "Serving features for machine learning", "ML Engineering", "Technical Guide", 2024),
        ]);
        let engine = RagEngine::from_config(
            &config,
            Arc::new(ScriptedProvider::new(replies)),
            Arc::new(index),
            store,
        );
        Arc::new(GatewayState { config, engine })
    }

    pub fn test_state(replies: Vec<ProviderResponse>) -> SharedState {
        test_state_with(replies, Arc::new(InMemoryCheckpointer::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use ragwise_core::error::MemoryError;
    use ragwise_core::memory::CheckpointStore;
    use ragwise_core::message::Message;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_reply_and_records_history() {
        let state = test_state(vec![text_response("Hello! Ask me about the knowledge base.")]);

        let response = api_router(state.clone())
            .oneshot(post_json("/chat", serde_json::json!({"message": "hello", "thread_id": "t1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"], "Hello! Ask me about the knowledge base.");

        let req = Request::builder()
            .uri("/conversation/t1")
            .body(Body::empty())
            .unwrap();
        let response = api_router(state).oneshot(req).await.unwrap();
        let history = body_json(response).await;
        assert_eq!(history[0]["type"], "human");
        assert_eq!(history[0]["content"], "hello");
        assert_eq!(history[1]["type"], "ai");
    }

    #[tokio::test]
    async fn chat_defaults_thread_id() {
        let state = test_state(vec![]);
        api_router(state.clone())
            .oneshot(post_json("/chat", serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(state.engine.get_history("default").await.len(), 2);
    }

    #[tokio::test]
    async fn chat_rejects_empty_and_oversized_messages() {
        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json("/chat", serde_json::json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Message cannot be empty");

        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json("/chat", serde_json::json!({"message": "a".repeat(1001)})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json("/chat/stream", serde_json::json!({"message": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_stream_emits_sse_events() {
        let app = api_router(test_state(vec![text_response("Streaming hello.")]));
        let response = app
            .oneshot(post_json("/chat/stream", serde_json::json!({"message": "hey"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(r#"data: {"type":"status","status":"thinking"}"#));
        assert!(text.contains(r#"data: {"type":"content","content":"Streaming hello."}"#));
        assert!(text.contains(r#"data: {"type":"status","status":"complete"}"#));
        assert!(text.contains("event: content"));
    }

    #[tokio::test]
    async fn basic_retrieval_returns_formatted_results() {
        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json("/retrieval", serde_json::json!({"query": "feature stores"})))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["retrieval_type"], "basic");
        assert!(json["results"].as_str().unwrap().starts_with("📄 Title: Feature Stores"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json("/retrieval", serde_json::json!({"query": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn filtered_retrieval_applies_known_values() {
        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json(
                "/retrieval/filter",
                serde_json::json!({"query": "deployments", "department": "Platform", "doc_type": "Any"}),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["applied_filters"], serde_json::json!({"department": "Platform"}));
        assert_eq!(json["filters"]["doc_type"], "Any");
        assert!(json["results"].as_str().unwrap().starts_with("📄 Kubernetes Rollouts"));
    }

    #[tokio::test]
    async fn enhanced_retrieval_extracts_filters() {
        let app = api_router(test_state(vec![]));
        let response = app
            .oneshot(post_json(
                "/retrieval/enhance",
                serde_json::json!({"query": "ML engineering technical guide"}),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["extracted_filters"]["department"], "ML Engineering");
        assert_eq!(json["extracted_filters"]["doc_type"], "Technical Guide");
        assert_eq!(json["results_count"], 1);
        assert!(json["results"].as_str().unwrap().contains("📝 Content: Serving features for machine learning"));
    }

    #[tokio::test]
    async fn analyze_explains_matches() {
        let app = api_router(test_state(vec![]));
        let req = Request::builder()
            .uri("/retrieval/analyze?query=AI%20research%20papers%20from%202023")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["extracted_filters"]["year"], 2023);
        assert_eq!(json["analysis"]["departments"][0]["match_type"], "exact");
        assert_eq!(json["analysis"]["found_years"][0], 2023);
        assert_eq!(json["suggested_filters"]["available_departments"].as_array().unwrap().len(), 8);
        assert_eq!(json["suggested_filters"]["available_years"][0], 2018);
    }

    #[tokio::test]
    async fn clear_conversation_then_history_is_empty() {
        let state = test_state(vec![]);
        state.engine.run("hi", "t9").await;

        let req = Request::builder()
            .method("DELETE")
            .uri("/conversation/t9")
            .body(Body::empty())
            .unwrap();
        let response = api_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Conversation cleared");

        let req = Request::builder()
            .uri("/conversation/t9")
            .body(Body::empty())
            .unwrap();
        let response = api_router(state).oneshot(req).await.unwrap();
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl CheckpointStore for ReadOnlyStore {
        fn name(&self) -> &str {
            "read_only"
        }
        async fn load(&self, _thread_id: &str) -> Result<Option<Vec<Message>>, MemoryError> {
            Ok(None)
        }
        async fn save(&self, _thread_id: &str, _messages: &[Message]) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("read-only".into()))
        }
        async fn clear(&self, _thread_id: &str) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("read-only".into()))
        }
    }

    #[tokio::test]
    async fn failed_clear_is_a_server_error() {
        let state = test_state_with(vec![], Arc::new(ReadOnlyStore));
        let req = Request::builder()
            .method("DELETE")
            .uri("/conversation/t1")
            .body(Body::empty())
            .unwrap();
        let response = api_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
