//! Provider router: selects the LLM provider named in config.
//!
//! Handles provider creation and lookup by name.

use crate::openai_compat::OpenAiCompatProvider;
use ragwise_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }
}

/// Build the provider router from configuration.
pub fn build_from_config(config: &ragwise_config::AppConfig) -> ProviderRouter {
    let provider_config = &config.provider;
    let mut router = ProviderRouter::new(&provider_config.name);

    let api_key = provider_config.api_key.clone().unwrap_or_default();
    let base_url = provider_config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&provider_config.name));

    tracing::debug!(provider = %provider_config.name, url = %base_url, "Registering provider");

    router.register(
        provider_config.name.clone(),
        Arc::new(OpenAiCompatProvider::new(
            &provider_config.name,
            &base_url,
            &api_key,
        )),
    );

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "mistral" => "https://api.mistral.ai/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_named_provider() {
        let mut router = ProviderRouter::new("openrouter");
        assert!(router.default().is_none());

        let provider = Arc::new(OpenAiCompatProvider::new(
            "openrouter",
            "https://openrouter.ai/api/v1",
            "sk-test",
        ));
        router.register("openrouter", provider);
        assert_eq!(router.default().unwrap().name(), "openrouter");
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("mistral").contains("api.mistral.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = ragwise_config::AppConfig::default();
        let router = build_from_config(&config);
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "mistral");
    }

    #[test]
    fn explicit_api_url_wins() {
        let mut config = ragwise_config::AppConfig::default();
        config.provider.name = "local".into();
        config.provider.api_url = Some("http://localhost:8080/v1".into());
        let router = build_from_config(&config);
        assert_eq!(router.default().unwrap().name(), "local");
    }
}
