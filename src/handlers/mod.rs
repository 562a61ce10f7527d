//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod chat;
pub mod health;

use crate::config::Settings;
use crate::middleware::logging::request_logging_middleware;
use crate::providers::ProviderCatalog;
use crate::services::{ProviderClient, ProviderDispatcher};
use anyhow::Result;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub dispatcher: Arc<ProviderDispatcher>,
}

/// Create application router
pub async fn create_router(settings: Settings, catalog: ProviderCatalog) -> Result<Router> {
    // Create the shared provider client
    let client = ProviderClient::new(Duration::from_secs(settings.dispatch.timeout))?;

    // Create the dispatcher
    let dispatcher = ProviderDispatcher::new(
        catalog,
        client,
        settings.dispatch.system_prompt.clone(),
        settings.dispatch.fallback_confidence,
    );

    // Create application state
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        dispatcher: Arc::new(dispatcher),
    });

    // Create middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(RequestBodyLimitLayer::new(settings.request.max_request_size));

    // Create routes
    let router = Router::new()
        .route("/api/chat", post(chat::handle_chat))
        .route("/api/providers", get(chat::list_providers))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .with_state(app_state)
        .layer(middleware_stack);

    Ok(router)
}
