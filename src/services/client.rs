//! HTTP client service
//!
//! Encapsulates outbound HTTP calls to the AI providers

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::providers::ProviderSpec;

/// Shared HTTP client for provider attempts
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
}

impl ProviderClient {
    /// Create a client; `timeout` is the default bound, overridden per
    /// request by each spec's own timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("chatrelay/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// POST the built body to the spec's endpoint and parse the JSON reply.
    /// Any non-2xx status becomes an error carrying the status and body.
    pub async fn complete(&self, spec: &ProviderSpec, body: &Value) -> Result<Value> {
        let url = spec.endpoint();
        // the Gemini endpoint carries its key as a query parameter
        let display_url = url.split('?').next().unwrap_or(&url);
        debug!("Calling provider {} at {}", spec.name, display_url);

        let request = self.client.post(&url).timeout(spec.timeout).json(body);
        let response = spec
            .apply_auth(request)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", spec.name))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", spec.name, status, error_text);
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse {} response", spec.name))
    }
}
