//! HTTP API gateway for Ragwise.
//!
//! Exposes the engine's chat, streaming, retrieval and conversation
//! operations as JSON endpoints. Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use ragwise_agent::RagEngine;
use ragwise_config::AppConfig;
use ragwise_retrieval::CachedRetrievalClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub engine: RagEngine,
}

pub type SharedState = Arc<GatewayState>;

/// Origins allowed to call the API from a browser.
const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Build the full router.
///
/// Layers applied:
/// - CORS for the local web frontend
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            ALLOWED_ORIGINS.into_iter().map(HeaderValue::from_static),
        ))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig, engine: RagEngine) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    spawn_cache_purge(engine.retrieval().clone());
    let state = Arc::new(GatewayState { config, engine });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drop expired retrieval cache entries once per TTL.
fn spawn_cache_purge(retrieval: CachedRetrievalClient) {
    let period = retrieval.cache().ttl().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = retrieval.cache().purge_expired();
            if removed > 0 {
                debug!(removed, remaining = retrieval.cache().len(), "Purged expired retrieval cache entries");
            }
        }
    });
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "API is running!",
        version: env!("CARGO_PKG_VERSION"),
    })
}
