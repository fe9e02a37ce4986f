use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use quote_infra::api::{create_router, ApiState};
use quote_infra::config::AppConfig;
use quote_infra::observability::{metrics, tracing::init_tracing};
use quote_infra::price_infra::connectors::build_registry;
use quote_infra::QuoteEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("QUOTEINFRA_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    init_tracing(&config.logging)?;
    metrics::register_metrics().context("registering metrics")?;

    // Per-call timeouts belong to the dispatcher; this only caps connects.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(config.engine.adapter_timeout_ms))
        .user_agent(concat!("QuoteInfra/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;

    let adapters = build_registry(&config.sources, client)?;
    let engine = QuoteEngine::new(adapters, &config.engine);

    let router = create_router(Arc::new(ApiState { engine }));
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;

    tracing::info!(
        bind = %config.server.bind,
        ttl_secs = config.engine.cache_ttl_secs,
        timeout_ms = config.engine.adapter_timeout_ms,
        max_concurrency = config.engine.max_concurrency,
        "QuoteInfra listening"
    );

    axum::serve(listener, router).await?;
    Ok(())
}
