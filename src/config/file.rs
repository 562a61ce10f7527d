//! File-based configuration overrides
//!
//! Loads optional per-provider overrides from a JSON file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::providers::ProviderKind;

/// Overrides for a single provider. Every field is optional; anything
/// left out keeps the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOverride {
    /// Force-enable or disable the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Model name to request from the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL for the provider API
    #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Position in the fallback chain (1 is tried first)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// Per-request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Confidence reported when this provider answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Overrides file loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverridesFile {
    /// Per-provider overrides, keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderOverride>,

    /// System prompt sent to every provider
    #[serde(rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Confidence reported by the static fallback answer
    #[serde(rename = "fallbackConfidence", skip_serializing_if = "Option::is_none")]
    pub fallback_confidence: Option<f64>,
}

impl OverridesFile {
    /// Load overrides from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading provider overrides from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read overrides file: {:?}", path))?;

        let overrides: OverridesFile =
            serde_json::from_str(&content).with_context(|| "Failed to parse overrides JSON")?;

        overrides.validate()?;

        debug!("Loaded overrides for {} providers", overrides.providers.len());
        Ok(overrides)
    }

    /// Load overrides from default locations
    /// Searches in order:
    /// 1. ~/.config/chatrelay/chatrelay.json
    /// 2. ./chatrelay.json
    ///
    /// The file is optional; returns Ok(None) when neither exists.
    pub fn load_default() -> Result<Option<Self>> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("chatrelay").join("chatrelay.json");
            if config_path.exists() {
                return Self::load(&config_path).map(Some);
            }
        }

        let local_path = Path::new("chatrelay.json");
        if local_path.exists() {
            return Self::load(local_path).map(Some);
        }

        debug!("No overrides file found, using built-in provider defaults");
        Ok(None)
    }

    /// Validate override values
    fn validate(&self) -> Result<()> {
        for (name, entry) in &self.providers {
            if ProviderKind::from_name(name).is_none() {
                let known: Vec<&str> = ProviderKind::ALL.iter().map(|kind| kind.as_str()).collect();
                anyhow::bail!(
                    "Unknown provider '{}' in overrides. Known providers: {}",
                    name,
                    known.join(", ")
                );
            }

            if let Some(confidence) = entry.confidence {
                if !(0.0..=1.0).contains(&confidence) {
                    anyhow::bail!("Confidence for provider '{}' must be between 0 and 1", name);
                }
            }

            if entry.timeout == Some(0) {
                anyhow::bail!("Timeout for provider '{}' must be greater than 0", name);
            }
        }

        if let Some(confidence) = self.fallback_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                anyhow::bail!("Fallback confidence must be between 0 and 1");
            }
        }

        Ok(())
    }
}
