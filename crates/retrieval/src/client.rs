//! Cached retrieval client: the only path from the engine to the index.

use crate::cache::RetrievalCache;
use crate::format;
use ragwise_core::retrieval::{FilterSet, RetrievedPassage, VectorIndex};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of a retrieval attempt. Never an error: index failures degrade.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// The requested search succeeded (from the index or the cache).
    Found(Vec<RetrievedPassage>),
    /// The requested search failed; these came from the unfiltered retry.
    Degraded(Vec<RetrievedPassage>),
    /// Both the search and the retry failed.
    Unavailable,
}

impl RetrievalOutcome {
    pub fn passages(&self) -> &[RetrievedPassage] {
        match self {
            Self::Found(p) | Self::Degraded(p) => p,
            Self::Unavailable => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Wraps a [`VectorIndex`] with a TTL cache and a retry-once fallback.
///
/// Unfiltered searches go through the cache; filtered searches always hit
/// the index. A failed search is retried once, unfiltered, with
/// `fallback_k` results.
#[derive(Clone)]
pub struct CachedRetrievalClient {
    index: Arc<dyn VectorIndex>,
    cache: Arc<RetrievalCache>,
    fallback_k: usize,
}

impl CachedRetrievalClient {
    pub fn new(index: Arc<dyn VectorIndex>, cache: Arc<RetrievalCache>) -> Self {
        Self {
            index,
            cache,
            fallback_k: 2,
        }
    }

    pub fn with_fallback_k(mut self, fallback_k: usize) -> Self {
        self.fallback_k = fallback_k;
        self
    }

    pub fn cache(&self) -> &RetrievalCache {
        &self.cache
    }

    /// Search for `k` passages, constrained by `filters` when non-empty.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        filters: Option<&FilterSet>,
    ) -> RetrievalOutcome {
        let started = Instant::now();
        let filters = filters.filter(|f| !f.is_empty());

        if filters.is_none() {
            if let Some(hit) = self.cache.get(query, k) {
                debug!(query, k, "Retrieval cache hit");
                return RetrievalOutcome::Found(hit);
            }
        }

        match self.index.similarity_search(query, k, filters).await {
            Ok(passages) => {
                if filters.is_none() {
                    self.cache.insert(query, k, passages.clone());
                }
                debug!(
                    query,
                    k,
                    filtered = filters.is_some(),
                    results = passages.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Retrieval complete"
                );
                RetrievalOutcome::Found(passages)
            }
            Err(e) => {
                warn!(index = self.index.name(), error = %e, "Retrieval failed, retrying unfiltered");
                match self.index.similarity_search(query, self.fallback_k, None).await {
                    Ok(passages) => RetrievalOutcome::Degraded(passages),
                    Err(e) => {
                        warn!(index = self.index.name(), error = %e, "Fallback retrieval failed");
                        RetrievalOutcome::Unavailable
                    }
                }
            }
        }
    }

    /// [`retrieve`](Self::retrieve), rendered as text for a tool result.
    pub async fn retrieve_formatted(
        &self,
        query: &str,
        k: usize,
        filters: Option<&FilterSet>,
    ) -> String {
        let filtered = filters.is_some_and(|f| !f.is_empty());
        match self.retrieve(query, k, filters).await {
            RetrievalOutcome::Found(p) if filtered => format::filtered(&p),
            RetrievalOutcome::Found(p) => format::summary(&p),
            RetrievalOutcome::Degraded(p) => format::fallback(&p),
            RetrievalOutcome::Unavailable => format::SEARCH_UNAVAILABLE.to_string(),
        }
    }
}
