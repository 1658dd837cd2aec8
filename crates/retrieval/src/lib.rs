//! Retrieval for Ragwise.
//!
//! - [`filters`] turns free text into a [`FilterSet`](ragwise_core::FilterSet)
//! - [`cache`] and [`client`] wrap a vector index with a TTL cache and a
//!   retry-once fallback
//! - [`format`] renders passages for the language model
//! - [`in_memory`] and [`qdrant`] are the index backends

pub mod cache;
pub mod client;
pub mod filters;
pub mod format;
pub mod in_memory;
pub mod qdrant;

pub use cache::RetrievalCache;
pub use client::{CachedRetrievalClient, RetrievalOutcome};
pub use filters::{FilterAnalysis, MatchKind, analyze_filters, extract_filters};
pub use in_memory::InMemoryIndex;
pub use qdrant::QdrantIndex;
