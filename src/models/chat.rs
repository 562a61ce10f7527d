//! Chat request, query, and dispatch result types

use serde::{Deserialize, Serialize};

/// Result type tag for answers produced by a provider
pub const TYPE_AI_RESPONSE: &str = "ai_response";
/// Result type tag for the static fallback answer
pub const TYPE_FALLBACK: &str = "fallback";

/// One prior conversation turn as sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Either "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Request body accepted by `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's current message
    pub message: String,
    /// Prior conversation turns, oldest first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatTurn>>,
    /// Request the NDJSON streaming response instead of a single JSON object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            messages: None,
            stream: None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// A validated query ready for dispatch: trimmed text plus a capped
/// conversation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatQuery {
    pub text: String,
    pub history: Vec<ChatTurn>,
}

impl ChatQuery {
    /// Build a query, trimming the text and capping the history to
    /// `max_history` turns. Eviction is FIFO and drops whole turn pairs so
    /// the retained window never starts mid-exchange.
    pub fn new(text: impl Into<String>, mut history: Vec<ChatTurn>, max_history: usize) -> Self {
        let mut drop = history.len().saturating_sub(max_history);
        if drop % 2 == 1 {
            drop += 1;
        }
        history.drain(..drop.min(history.len()));
        Self {
            text: text.into().trim().to_string(),
            history,
        }
    }

    pub fn from_request(request: &ChatRequest, max_history: usize) -> Self {
        Self::new(
            request.message.clone(),
            request.messages.clone().unwrap_or_default(),
            max_history,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The outcome of one dispatch, serialized directly as the `/api/chat`
/// response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub answer: String,
    /// Name of the provider that answered, or "fallback"
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub confidence: f64,
    /// Human-readable elapsed time, e.g. "412ms"
    pub runtime: String,
    #[serde(rename = "type")]
    pub result_type: String,
    #[serde(rename = "processingTime")]
    pub processing_time: u64,
    /// Provider names in the order they were tried, failures included
    #[serde(rename = "providersAttempted")]
    pub providers_attempted: Vec<String>,
}

impl DispatchResult {
    pub fn is_fallback(&self) -> bool {
        self.result_type == TYPE_FALLBACK
    }
}
