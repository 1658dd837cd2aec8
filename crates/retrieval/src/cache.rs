//! TTL cache for unfiltered similarity searches.
//!
//! Entries are keyed by a digest of the normalized query and the result
//! count. An entry older than the TTL is never served: lookups drop it.
//! The map is unbounded; `clear` and `purge_expired` are the only eviction
//! besides expiry on lookup.

use ragwise_core::retrieval::RetrievedPassage;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    results: Vec<RetrievedPassage>,
    created_at: Instant,
}

/// Shared search-result cache. Cheap to share behind an `Arc`.
pub struct RetrievalCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl RetrievalCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cache key for `(query, k)`.
    ///
    /// Queries differing only in case or whitespace share a key.
    pub fn cache_key(query: &str, k: usize) -> String {
        let normalized = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        format!("search_{}_{k}", hex::encode(digest))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are written whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached results for `(query, k)` if present and younger than the TTL.
    pub fn get(&self, query: &str, k: usize) -> Option<Vec<RetrievedPassage>> {
        let key = Self::cache_key(query, k);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.results.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store results for `(query, k)`, replacing any previous entry.
    pub fn insert(&self, query: &str, k: usize, results: Vec<RetrievedPassage>) {
        let key = Self::cache_key(query, k);
        self.lock().insert(
            key,
            CacheEntry {
                results,
                created_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.created_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
