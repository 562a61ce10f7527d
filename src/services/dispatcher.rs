//! Priority-ordered provider dispatch with a static fallback
//!
//! One query in, one result out, always. Providers are tried strictly in
//! sequence; any failure moves on to the next, and when nothing answers the
//! caller still gets the fallback result rather than an error.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::models::chat::{ChatQuery, DispatchResult, TYPE_AI_RESPONSE, TYPE_FALLBACK};
use crate::providers::ProviderCatalog;
use crate::services::client::ProviderClient;

/// Answer served when every provider fails or none are configured
pub const FALLBACK_ANSWER: &str =
    "I'm having trouble reaching my AI providers right now. Please try again in a moment.";
/// Source name reported by fallback results
pub const FALLBACK_SOURCE: &str = "fallback";
const FALLBACK_CATEGORY: &str = "offline";

/// Turns one [`ChatQuery`] into one [`DispatchResult`]. Holds only
/// immutable configuration; safe to share behind an `Arc`.
#[derive(Debug)]
pub struct ProviderDispatcher {
    catalog: ProviderCatalog,
    client: ProviderClient,
    system_prompt: String,
    fallback_confidence: f64,
}

impl ProviderDispatcher {
    pub fn new(
        catalog: ProviderCatalog,
        client: ProviderClient,
        system_prompt: String,
        fallback_confidence: f64,
    ) -> Self {
        Self {
            catalog,
            client,
            system_prompt,
            fallback_confidence,
        }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Try every enabled provider in priority order and return the first
    /// non-empty answer, or the static fallback. Never fails.
    pub async fn dispatch(&self, query: &ChatQuery) -> DispatchResult {
        let started = Instant::now();
        let mut attempted: Vec<String> = Vec::new();

        if query.is_empty() {
            warn!("Dispatch called with an empty query");
            return self.fallback_result(attempted, started);
        }

        for spec in self.catalog.enabled() {
            attempted.push(spec.name.clone());
            debug!("Trying provider {} (priority {})", spec.name, spec.priority);

            let body = spec.build_body(query, &self.system_prompt);
            match self.client.complete(spec, &body).await {
                Ok(reply) => match spec.extract_answer(&reply) {
                    Some(answer) => {
                        let elapsed = started.elapsed().as_millis() as u64;
                        info!("Provider {} answered in {}ms", spec.name, elapsed);
                        return DispatchResult {
                            answer,
                            source: spec.name.clone(),
                            model: Some(spec.model.clone()),
                            category: None,
                            confidence: spec.confidence,
                            runtime: format!("{}ms", elapsed),
                            result_type: TYPE_AI_RESPONSE.to_string(),
                            processing_time: elapsed,
                            providers_attempted: attempted,
                        };
                    }
                    None => warn!("Provider {} returned an empty answer", spec.name),
                },
                Err(e) => warn!("Provider {} failed: {}", spec.name, e),
            }
        }

        if attempted.is_empty() {
            debug!("No providers enabled; serving fallback");
        } else {
            warn!("All {} attempted providers failed; serving fallback", attempted.len());
        }
        self.fallback_result(attempted, started)
    }

    fn fallback_result(&self, providers_attempted: Vec<String>, started: Instant) -> DispatchResult {
        let elapsed = started.elapsed().as_millis() as u64;
        DispatchResult {
            answer: FALLBACK_ANSWER.to_string(),
            source: FALLBACK_SOURCE.to_string(),
            model: None,
            category: Some(FALLBACK_CATEGORY.to_string()),
            confidence: self.fallback_confidence,
            runtime: format!("{}ms", elapsed),
            result_type: TYPE_FALLBACK.to_string(),
            processing_time: elapsed,
            providers_attempted,
        }
    }
}
