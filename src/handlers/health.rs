//! Health check handlers
//!
//! Provides application health status check endpoints

use crate::handlers::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Initialized on the first health probe
static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Version information
    pub version: String,
    /// Timestamp
    pub timestamp: String,
    /// Details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

/// Check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Providers with a usable API key
    pub providers_enabled: usize,
    /// Providers known to the dispatcher
    pub providers_total: usize,
    /// Configuration status
    pub config: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Memory usage (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<MemoryUsage>,
}

/// Memory usage information
#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Used memory in bytes
    pub used_bytes: u64,
    /// Total memory in bytes
    pub total_bytes: u64,
    /// Usage percentage
    pub usage_percent: f64,
}

/// Basic health check
///
/// Returns basic service status information
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");

    let catalog = state.dispatcher.catalog();

    let response = HealthResponse {
        status: "healthy".to_string(),
        service: "Chat Relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details: Some(HealthDetails {
            providers_enabled: catalog.enabled_count(),
            providers_total: catalog.specs().len(),
            config: "valid".to_string(),
            uptime_seconds: get_uptime_seconds(),
            memory_usage: get_memory_usage(),
        }),
    };

    Json(response)
}

/// Readiness check
///
/// GET /health/ready
/// Check if the service is ready to receive requests. The relay always
/// answers requests, but with zero enabled providers every answer would
/// be the fallback, so that state reports not ready.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    debug!("Executing readiness check");

    let catalog = state.dispatcher.catalog();
    let enabled = catalog.enabled_count();

    // Return 503 status code if no provider can answer
    if enabled == 0 {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let details = HealthDetails {
        providers_enabled: enabled,
        providers_total: catalog.specs().len(),
        config: "valid".to_string(),
        uptime_seconds: get_uptime_seconds(),
        memory_usage: get_memory_usage(),
    };

    let response = HealthResponse {
        status: "ready".to_string(),
        service: "Chat Relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details: Some(details),
    };

    Ok(Json(response))
}

/// Liveness check
///
/// GET /health/live
/// Check if the service is still running. Does not check providers.
pub async fn liveness_check(
    State(_state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    debug!("Executing liveness check");

    let response = HealthResponse {
        status: "alive".to_string(),
        service: "Chat Relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details: None,
    };

    Ok(Json(response))
}

/// Get service uptime in seconds
fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

/// Get memory usage information by reading /proc/self/status
#[cfg(target_os = "linux")]
fn get_memory_usage() -> Option<MemoryUsage> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;

    let mut vm_rss = None;
    let mut vm_size = None;

    for line in status.lines() {
        if line.starts_with("VmRSS:") {
            vm_rss = parse_kb_line(line);
        } else if line.starts_with("VmSize:") {
            vm_size = parse_kb_line(line);
        }
    }

    let (used, total) = (vm_rss?, vm_size?);
    let usage_percent = if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    Some(MemoryUsage {
        used_bytes: used,
        total_bytes: total,
        usage_percent,
    })
}

/// Parse a `VmRSS: 1234 kB` style line into bytes
#[cfg(target_os = "linux")]
fn parse_kb_line(line: &str) -> Option<u64> {
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

/// Memory inspection is only wired up for Linux
#[cfg(not(target_os = "linux"))]
fn get_memory_usage() -> Option<MemoryUsage> {
    None
}
