//! Qdrant vector index over the REST API.
//!
//! Points are expected in the LangChain layout: the payload holds the text
//! under `page_content` and every other field under `metadata`, so filter
//! keys are `metadata.<field>`. Queries are embedded through the configured
//! provider before searching.

use async_trait::async_trait;
use ragwise_core::error::RetrievalError;
use ragwise_core::provider::{EmbeddingRequest, Provider};
use ragwise_core::retrieval::{FilterSet, PassageMetadata, RetrievedPassage, VectorIndex};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct QdrantIndex {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    collection: String,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
}

impl QdrantIndex {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            api_key,
            collection: collection.into(),
            embedder,
            embedding_model: embedding_model.into(),
        }
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::EmbeddingFailed("empty embedding response".into()))
    }
}

/// The body of a `points/search` request.
fn search_body(vector: Vec<f32>, k: usize, filter: Option<&FilterSet>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "vector": vector,
        "limit": k,
        "with_payload": true,
    });

    if let Some(filter) = filter {
        let must: Vec<serde_json::Value> = filter
            .conditions()
            .into_iter()
            .map(|(key, value)| {
                serde_json::json!({
                    "key": format!("metadata.{key}"),
                    "match": { "value": value },
                })
            })
            .collect();
        if !must.is_empty() {
            body["filter"] = serde_json::json!({ "must": must });
        }
    }

    body
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    page_content: String,
    #[serde(default)]
    metadata: PassageMetadata,
}

fn take_string(metadata: &mut PassageMetadata, key: &str) -> String {
    match metadata.extra.remove(key) {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn into_passages(response: SearchResponse) -> Vec<RetrievedPassage> {
    response
        .result
        .into_iter()
        .map(|point| {
            let Payload {
                page_content,
                mut metadata,
            } = point.payload.unwrap_or_default();
            RetrievedPassage {
                content: page_content,
                title: take_string(&mut metadata, "title"),
                source: take_string(&mut metadata, "source"),
                metadata,
            }
        })
        .collect()
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&FilterSet>,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let vector = self.embed_query(query).await?;
        let body = search_body(vector, k, filter);
        let url = format!("{}/collections/{}/points/search", self.url, self.collection);

        debug!(collection = %self.collection, k, filtered = filter.is_some(), "Qdrant search");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::SearchFailed(format!("HTTP {status}: {text}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::SearchFailed(format!("Invalid search response: {e}")))?;

        Ok(into_passages(parsed))
    }
}
