mod color;
mod config;
mod document;
mod error;
mod extract;
mod favorites;
mod fuzzy;
mod ingest;
mod layout;
mod matcher;
mod pdf;
mod quotation;
mod search;
mod server;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use pricing_common::redis::RedisStore;
use pricing_common::store::{MemoryStore, PricingStore};
use search::QuoteService;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting price-finder API server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        redis = config.redis_url.is_some(),
        threshold = config.match_options.threshold,
        scoring = ?config.match_options.scoring,
        max_upload_bytes = config.max_upload_bytes,
        cors_origins = ?config.cors_origins,
        "configuration loaded"
    );

    // 2. Pick the store (Redis when reachable, memory otherwise)
    let store = open_store(config.redis_url.as_deref()).await;

    // 3. Build services and routes
    let quotes = QuoteService::new(Arc::clone(&store), config.match_options);
    let state = AppState::new(store, quotes, config.items_default_limit);
    let cors = server::cors_layer(&config.cors_origins)?;
    let app = server::router(state, config.max_upload_bytes, cors);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "HTTP server ready");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "HTTP server error"))?;

    info!("HTTP server shut down");
    Ok(())
}

async fn open_store(redis_url: Option<&str>) -> Arc<dyn PricingStore> {
    let Some(url) = redis_url else {
        info!("no REDIS_URL set, using in-memory store");
        return Arc::new(MemoryStore::new());
    };

    match RedisStore::new(url) {
        Ok(store) if store.is_available().await => {
            info!("redis connected");
            Arc::new(store)
        }
        Ok(_) => {
            warn!("redis unavailable, falling back to in-memory store");
            Arc::new(MemoryStore::new())
        }
        Err(e) => {
            warn!(error = %e, "invalid redis configuration, falling back to in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
