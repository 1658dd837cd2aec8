//! Knowledge-base tools for Ragwise.
//!
//! The model never touches the vector index directly. It asks for one of
//! these two tools and the conversation graph executes the call.

pub mod retrieve;
pub mod retrieve_with_filters;

use ragwise_core::tool::ToolRegistry;
use ragwise_retrieval::CachedRetrievalClient;
use std::sync::Arc;

pub use retrieve::RetrieveTool;
pub use retrieve_with_filters::{RetrieveWithFiltersTool, filters_from_arguments};

/// Name of the unfiltered search tool.
pub const RETRIEVE: &str = "retrieve";

/// Name of the metadata-filtered search tool.
pub const RETRIEVE_WITH_FILTERS: &str = "retrieve_with_filters";

/// Register both retrieval tools over one shared client.
pub fn retrieval_registry(
    client: CachedRetrievalClient,
    top_k: usize,
    filtered_top_k: usize,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RetrieveTool::new(client.clone(), top_k)));
    registry.register(Arc::new(RetrieveWithFiltersTool::new(client, filtered_top_k)));
    registry
}
