//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::config::file::OverridesFile;
use crate::providers::ProviderKind;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, concise assistant. Answer the \
user's question directly, and say so plainly when you do not know.";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Provider dispatch configuration
    pub dispatch: DispatchConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Per-provider API keys
    pub secrets: ProviderSecrets,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Provider dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-provider request timeout in seconds
    pub timeout: u64,
    /// Confidence reported by the static fallback answer
    pub fallback_confidence: f64,
    /// Maximum conversation turns kept when building a query
    pub max_history: usize,
    /// System message sent to every provider
    pub system_prompt: String,
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Inbound request timeout in seconds
    pub timeout: u64,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Whether CORS is enabled
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text or json)
    pub format: String,
}

/// API keys for upstream providers. A missing key disables that provider;
/// the server still runs and answers from the fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSecrets {
    pub openrouter: Option<String>,
    pub openai: Option<String>,
    pub grok: Option<String>,
    pub claude: Option<String>,
    pub gemini: Option<String>,
}

impl ProviderSecrets {
    /// Look up the configured key for a provider
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        let secret = match kind {
            ProviderKind::OpenRouter => &self.openrouter,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Grok => &self.grok,
            ProviderKind::Claude => &self.claude,
            ProviderKind::Gemini => &self.gemini,
        };
        secret.as_deref()
    }
}

impl Settings {
    /// Load configuration from environment variables, reading a `.env`
    /// file first if one is present.
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let settings = Settings {
            server: ServerConfig {
                host: get_env_or_default("SERVER_HOST", "0.0.0.0"),
                port: get_env_or_default("SERVER_PORT", "8090")
                    .parse()
                    .context("Invalid SERVER_PORT value")?,
            },
            dispatch: DispatchConfig {
                timeout: get_env_or_default("DISPATCH_TIMEOUT", "12")
                    .parse()
                    .context("Invalid DISPATCH_TIMEOUT value")?,
                fallback_confidence: get_env_or_default("FALLBACK_CONFIDENCE", "0.5")
                    .parse()
                    .context("Invalid FALLBACK_CONFIDENCE value")?,
                max_history: get_env_or_default("MAX_HISTORY", "10")
                    .parse()
                    .context("Invalid MAX_HISTORY value")?,
                system_prompt: get_env_or_default("CHAT_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            },
            request: RequestConfig {
                max_request_size: get_env_or_default("MAX_REQUEST_SIZE", "1048576")
                    .parse()
                    .context("Invalid MAX_REQUEST_SIZE value")?,
                timeout: get_env_or_default("REQUEST_TIMEOUT", "30")
                    .parse()
                    .context("Invalid REQUEST_TIMEOUT value")?,
            },
            security: SecurityConfig {
                allowed_origins: get_env_or_default("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .collect(),
                cors_enabled: get_env_or_default("CORS_ENABLED", "true")
                    .parse()
                    .context("Invalid CORS_ENABLED value")?,
            },
            logging: LoggingConfig {
                level: get_env_or_default("LOG_LEVEL", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
            secrets: ProviderSecrets {
                openrouter: get_secret("OPENROUTER_API_KEY"),
                openai: get_secret("OPENAI_API_KEY"),
                grok: get_secret("GROK_API_KEY"),
                claude: get_secret("CLAUDE_API_KEY"),
                gemini: get_secret("GEMINI_API_KEY"),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port cannot be 0");
        }

        if self.dispatch.timeout == 0 {
            bail!("Dispatch timeout must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.dispatch.fallback_confidence) {
            bail!("Fallback confidence must be between 0 and 1");
        }

        if self.dispatch.system_prompt.trim().is_empty() {
            bail!("System prompt cannot be empty");
        }

        if self.request.max_request_size == 0 {
            bail!("Max request size must be greater than 0");
        }

        if self.request.timeout == 0 {
            bail!("Request timeout must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            );
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format: {}. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            );
        }

        Ok(())
    }

    /// Fold the global knobs from an overrides file into the settings
    pub fn apply_overrides(&mut self, overrides: &OverridesFile) {
        if let Some(prompt) = &overrides.system_prompt {
            self.dispatch.system_prompt = prompt.clone();
        }
        if let Some(confidence) = overrides.fallback_confidence {
            self.dispatch.fallback_confidence = confidence;
        }
    }
}

/// Read an environment variable, falling back to the given default
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a secret; whitespace-only values count as unset
fn get_secret(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
