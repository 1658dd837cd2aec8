//! Wiring from configuration to a ready [`RagEngine`].

use ragwise_agent::RagEngine;
use ragwise_config::AppConfig;
use ragwise_core::memory::CheckpointStore;
use ragwise_core::provider::Provider;
use ragwise_core::retrieval::VectorIndex;
use ragwise_memory::{FileCheckpointer, InMemoryCheckpointer};
use ragwise_retrieval::{InMemoryIndex, QdrantIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Fail early with setup instructions when no API key is available.
///
/// Local providers (ollama, vllm) run without a key.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() || matches!(config.provider.name.as_str(), "ollama" | "vllm") {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    MISTRAL_API_KEY = '...'   (default provider)");
    eprintln!("    OPENAI_API_KEY  = 'sk-...'");
    eprintln!("    RAGWISE_API_KEY = '...'   (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Build the engine described by `config`.
pub fn build_engine(config: &AppConfig) -> Result<RagEngine, Box<dyn std::error::Error>> {
    let router = ragwise_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;

    let index = build_index(config, provider.clone())?;
    let store = build_store(config);

    info!(
        provider = %config.provider.name,
        model = %config.provider.model,
        index = index.name(),
        memory = store.name(),
        "Engine ready"
    );

    Ok(RagEngine::from_config(config, provider, index, store))
}

fn build_index(
    config: &AppConfig,
    embedder: Arc<dyn Provider>,
) -> Result<Arc<dyn VectorIndex>, Box<dyn std::error::Error>> {
    let vs = &config.vector_store;
    match vs.backend.as_str() {
        "qdrant" => {
            let url = vs
                .url
                .clone()
                .ok_or("vector_store.url is required for the qdrant backend")?;
            Ok(Arc::new(QdrantIndex::new(
                url,
                vs.api_key.clone(),
                vs.collection.clone(),
                embedder,
                config.provider.embedding_model.clone(),
            )))
        }
        _ => {
            let index = match &vs.seed_file {
                Some(path) => InMemoryIndex::from_json_file(Path::new(path))?,
                None => InMemoryIndex::new(),
            };
            if index.is_empty() {
                warn!("In-memory knowledge base is empty, set vector_store.seed_file");
            }
            Ok(Arc::new(index))
        }
    }
}

fn build_store(config: &AppConfig) -> Arc<dyn CheckpointStore> {
    match config.memory.backend.as_str() {
        "file" => Arc::new(FileCheckpointer::new(config.threads_dir())),
        _ => Arc::new(InMemoryCheckpointer::new()),
    }
}
