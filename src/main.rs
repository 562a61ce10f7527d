//! Chat Relay Server
//!
//! HTTP service that answers chat requests by trying LLM providers in
//! priority order, with a static fallback when every provider fails

use anyhow::{Context, Result};
use tracing::{info, warn};

use chatrelay::config::{OverridesFile, Settings};
use chatrelay::handlers::create_router;
use chatrelay::providers::ProviderCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("🚀 Starting {}", chatrelay::version_info());

    // Load settings from environment
    let mut settings = Settings::new().context("Failed to load configuration")?;
    info!("📝 Configuration loaded");

    // Load optional provider overrides from JSON file
    let overrides = OverridesFile::load_default().context("Failed to load provider overrides")?;
    if let Some(overrides) = &overrides {
        settings.apply_overrides(overrides);
        info!("📁 Provider overrides loaded");
    }

    // Build the provider catalog
    let catalog = ProviderCatalog::from_settings(&settings, overrides.as_ref());
    let enabled = catalog.enabled_count();
    if enabled == 0 {
        warn!("⚠️ No provider secrets configured; every chat will use the fallback answer");
    } else {
        info!("🔌 {} of {} providers enabled", enabled, catalog.specs().len());
    }

    // Create router
    let app = create_router(settings.clone(), catalog).await?;

    // Build server address
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Chat relay server started!");
    info!("💬 Chat endpoint: http://{}/api/chat", addr);
    info!("📋 Provider list: http://{}/api/providers", addr);
    info!("❤️ Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    Ok(())
}

/// Initialize logging system
fn init_logging() {
    // Get log level from environment variable, default to info
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    // Check if JSON format should be used
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if log_format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(log_level)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(log_level)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Logging system initialized");
}
