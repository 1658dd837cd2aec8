//! Configuration loading, validation, and management for Ragwise.
//!
//! Loads configuration from `~/.ragwise/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ragwise/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retrieval and caching
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Decoding parameters for the answer-generation step
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Vector index collaborator
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Thread history checkpointing
    #[serde(default)]
    pub memory: MemoryConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name: "mistral", "openai", "openrouter", "ollama", or any
    /// OpenAI-compatible endpoint given via `api_url`
    #[serde(default = "default_provider")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Model used to embed queries for the Qdrant backend
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_provider() -> String {
    "mistral".into()
}
fn default_model() -> String {
    "mistral-small-2506".into()
}
fn default_embedding_model() -> String {
    "mistral-embed".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            api_key: None,
            api_url: None,
            model: default_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages fetched by the unfiltered `retrieve` tool
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Passages fetched by the `retrieve_with_filters` tool
    #[serde(default = "default_top_k")]
    pub filtered_top_k: usize,

    /// Passages fetched by the enhanced retrieval endpoint
    #[serde(default = "default_enhanced_top_k")]
    pub enhanced_top_k: usize,

    /// Passages fetched by the unfiltered retry after a failed search
    #[serde(default = "default_fallback_k")]
    pub fallback_k: usize,

    /// Lifetime of cached unfiltered search results
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Year assumed for "recent"/"latest"/"new"/"current" queries
    #[serde(default = "default_current_year")]
    pub current_year: i32,
}

fn default_top_k() -> usize {
    3
}
fn default_enhanced_top_k() -> usize {
    5
}
fn default_fallback_k() -> usize {
    2
}
fn default_cache_ttl() -> u64 {
    300
}
fn default_current_year() -> i32 {
    2024
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            filtered_top_k: default_top_k(),
            enhanced_top_k: default_enhanced_top_k(),
            fallback_k: default_fallback_k(),
            cache_ttl_secs: default_cache_ttl(),
            current_year: default_current_year(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Character budget for the retrieved context in the system prompt
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

fn default_max_tokens() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.85
}
fn default_context_chars() -> usize {
    5000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            context_chars: default_context_chars(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// "in_memory" or "qdrant"
    #[serde(default = "default_in_memory")]
    pub backend: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// JSON file of passages to load into the in-memory index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,
}

fn default_in_memory() -> String {
    "in_memory".into()
}
fn default_collection() -> String {
    "enterprise_knowledge".into()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_in_memory(),
            url: None,
            api_key: None,
            collection: default_collection(),
            seed_file: None,
        }
    }
}

impl std::fmt::Debug for VectorStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("collection", &self.collection)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "in_memory" or "file"
    #[serde(default = "default_in_memory")]
    pub backend: String,

    /// Directory for the file backend (default: `~/.ragwise/threads`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_in_memory(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Longest accepted chat message, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_message_chars() -> usize {
    1000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ragwise/config.toml).
    ///
    /// Environment variables override file values:
    /// - `RAGWISE_API_KEY`, then `MISTRAL_API_KEY`, then `OPENAI_API_KEY`
    /// - `RAGWISE_PROVIDER`, `RAGWISE_MODEL`
    /// - `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION_NAME`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = lookup("RAGWISE_API_KEY")
                .or_else(|| lookup("MISTRAL_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(provider) = lookup("RAGWISE_PROVIDER") {
            self.provider.name = provider;
        }
        if let Some(model) = lookup("RAGWISE_MODEL") {
            self.provider.model = model;
        }

        // A Qdrant URL in the environment switches the vector backend.
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = Some(url);
            self.vector_store.backend = "qdrant".into();
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION_NAME") {
            self.vector_store.collection = collection;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragwise")
    }

    /// Directory used by the file checkpoint backend when none is configured.
    pub fn threads_dir(&self) -> PathBuf {
        self.memory
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("threads"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(g.top_p > 0.0 && g.top_p <= 1.0) {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be in (0.0, 1.0]".into(),
            ));
        }
        if g.context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "generation.context_chars must be > 0".into(),
            ));
        }

        let r = &self.retrieval;
        if r.top_k == 0 || r.filtered_top_k == 0 || r.enhanced_top_k == 0 || r.fallback_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval result counts must be > 0".into(),
            ));
        }

        match self.vector_store.backend.as_str() {
            "in_memory" => {}
            "qdrant" if self.vector_store.url.is_some() => {}
            "qdrant" => {
                return Err(ConfigError::ValidationError(
                    "vector_store.url is required for the qdrant backend".into(),
                ));
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown vector_store.backend '{other}' (expected in_memory or qdrant)"
                )));
            }
        }

        if !matches!(self.memory.backend.as_str(), "in_memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "unknown memory.backend '{}' (expected in_memory or file)",
                self.memory.backend
            )));
        }

        if self.gateway.max_message_chars == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_message_chars must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.name, "mistral");
        assert_eq!(config.retrieval.cache_ttl_secs, 300);
        assert_eq!(config.retrieval.current_year, 2024);
        assert_eq!(config.generation.max_tokens, 512);
        assert_eq!(config.gateway.max_message_chars, 1000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.model, config.provider.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_top_p_rejected() {
        let mut config = AppConfig::default();
        config.generation.top_p = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn qdrant_backend_requires_url() {
        let mut config = AppConfig::default();
        config.vector_store.backend = "qdrant".into();
        assert!(config.validate().is_err());
        config.vector_store.url = Some("http://localhost:6333".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_memory_backend_rejected() {
        let mut config = AppConfig::default();
        config.memory.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider.name, "mistral");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[retrieval]\ncache_ttl_secs = 60\n\n[gateway]\nport = 9100\n",
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.retrieval.cache_ttl_secs, 60);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MISTRAL_API_KEY", "mk-test"),
            ("QDRANT_URL", "http://qdrant:6333"),
            ("QDRANT_COLLECTION_NAME", "docs"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("mk-test"));
        assert_eq!(config.vector_store.backend, "qdrant");
        assert_eq!(config.vector_store.collection, "docs");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".into());
        config.vector_store.api_key = Some("qd-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(!dbg.contains("qd-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
