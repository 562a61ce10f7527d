//! Provider catalog: a data-driven, priority-ordered list of specs
//!
//! The catalog is built once at startup from settings plus the optional
//! overrides file, then handed to the dispatcher as immutable data.

pub mod kind;

pub use kind::ProviderKind;

use std::time::Duration;

use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::warn;

use crate::config::file::OverridesFile;
use crate::config::settings::Settings;
use crate::models::chat::ChatQuery;

/// Everything needed to try one provider: identity, order, wire settings,
/// and the static confidence reported on success.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub name: String,
    pub kind: ProviderKind,
    /// Lower priority is tried first
    pub priority: u8,
    pub base_url: String,
    pub model: String,
    pub secret: Option<String>,
    pub timeout: Duration,
    pub confidence: f64,
}

impl ProviderSpec {
    /// A provider without a usable secret is skipped and never counted as
    /// tried. Template placeholders like `YOUR_OPENAI_KEY` count as unset.
    pub fn enabled(&self) -> bool {
        matches!(
            &self.secret,
            Some(secret) if !secret.trim().is_empty() && !secret.contains("YOUR_")
        )
    }

    pub fn endpoint(&self) -> String {
        self.kind
            .endpoint(&self.base_url, &self.model, self.secret.as_deref().unwrap_or_default())
    }

    pub fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        self.kind
            .apply_auth(request, self.secret.as_deref().unwrap_or_default())
    }

    pub fn build_body(&self, query: &ChatQuery, system_prompt: &str) -> Value {
        self.kind.build_body(query, &self.model, system_prompt)
    }

    pub fn extract_answer(&self, body: &Value) -> Option<String> {
        self.kind.extract_answer(body)
    }
}

/// Immutable, priority-sorted provider list
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    specs: Vec<ProviderSpec>,
}

impl ProviderCatalog {
    pub fn new(mut specs: Vec<ProviderSpec>) -> Self {
        specs.sort_by_key(|spec| spec.priority);
        Self { specs }
    }

    /// Build the catalog from settings, then apply the overrides file on
    /// top. Unknown override names are skipped with a warning.
    pub fn from_settings(settings: &Settings, overrides: Option<&OverridesFile>) -> Self {
        let timeout = Duration::from_secs(settings.dispatch.timeout);
        let mut specs: Vec<ProviderSpec> = ProviderKind::ALL
            .iter()
            .enumerate()
            .map(|(index, &kind)| ProviderSpec {
                name: kind.as_str().to_string(),
                kind,
                priority: index as u8 + 1,
                base_url: kind.default_base_url().to_string(),
                model: kind.default_model().to_string(),
                secret: settings.secrets.get(kind).map(str::to_string),
                timeout,
                confidence: kind.default_confidence(),
            })
            .collect();

        if let Some(overrides) = overrides {
            for (name, entry) in &overrides.providers {
                let Some(spec) = specs.iter_mut().find(|spec| spec.name == *name) else {
                    warn!("Ignoring overrides for unknown provider: {}", name);
                    continue;
                };
                if entry.enabled == Some(false) {
                    spec.secret = None;
                }
                if let Some(model) = &entry.model {
                    spec.model = model.clone();
                }
                if let Some(base_url) = &entry.base_url {
                    spec.base_url = base_url.clone();
                }
                if let Some(priority) = entry.priority {
                    spec.priority = priority;
                }
                if let Some(timeout) = entry.timeout {
                    spec.timeout = Duration::from_secs(timeout);
                }
                if let Some(confidence) = entry.confidence {
                    spec.confidence = confidence;
                }
            }
        }

        Self::new(specs)
    }

    /// All specs in priority order, enabled or not
    pub fn specs(&self) -> &[ProviderSpec] {
        &self.specs
    }

    /// Specs that can actually be tried, in priority order
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.specs.iter().filter(|spec| spec.enabled())
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    pub fn get(&self, name: &str) -> Option<&ProviderSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, priority: u8, secret: Option<&str>) -> ProviderSpec {
        ProviderSpec {
            name: name.to_string(),
            kind: ProviderKind::OpenAi,
            priority,
            base_url: "https://example.com".to_string(),
            model: "test-model".to_string(),
            secret: secret.map(str::to_string),
            timeout: Duration::from_secs(2),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_enabled_requires_real_secret() {
        assert!(spec("a", 1, Some("sk-real-key")).enabled());
        assert!(!spec("b", 1, None).enabled());
        assert!(!spec("c", 1, Some("")).enabled());
        assert!(!spec("d", 1, Some("   ")).enabled());
        assert!(!spec("e", 1, Some("YOUR_OPENAI_KEY")).enabled());
    }

    #[test]
    fn test_catalog_sorts_by_priority() {
        let catalog = ProviderCatalog::new(vec![
            spec("late", 9, Some("key")),
            spec("early", 1, Some("key")),
            spec("middle", 5, None),
        ]);
        let names: Vec<&str> = catalog.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["early", "middle", "late"]);

        let enabled: Vec<&str> = catalog.enabled().map(|s| s.name.as_str()).collect();
        assert_eq!(enabled, vec!["early", "late"]);
        assert_eq!(catalog.enabled_count(), 2);
    }

    #[test]
    fn test_catalog_get_by_name() {
        let catalog = ProviderCatalog::new(vec![spec("alpha", 1, None)]);
        assert!(catalog.get("alpha").is_some());
        assert!(catalog.get("beta").is_none());
    }
}
