//! `ragwise serve`: Start the HTTP API server.

use crate::runtime;
use ragwise_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    runtime::require_api_key(&config)?;
    let engine = runtime::build_engine(&config)?;

    println!("📚 Ragwise Gateway");
    println!("   Listening:    {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:        {}", config.provider.model);
    println!("   Vector store: {}", config.vector_store.backend);
    println!("   Memory:       {}", config.memory.backend);

    ragwise_gateway::start(config, engine).await?;

    Ok(())
}
