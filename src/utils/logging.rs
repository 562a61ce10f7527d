//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::models::ChatRequest;

/// Set to true to include full request details in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Truncate a string with a note about original length
fn truncate_content(s: &str, max_len: usize) -> String {
    let total = s.chars().count();
    if total > max_len {
        let head: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", head, total - max_len)
    } else {
        s.to_string()
    }
}

/// Create a filtered summary of a chat request for logging
/// Keeps the shape recognizable but truncates verbose content
pub fn chat_request_log_summary(request: &ChatRequest) -> serde_json::Value {
    if VERBOSE_REQUEST_LOGGING {
        serde_json::to_value(request).unwrap_or(serde_json::json!({"error": "serialize failed"}))
    } else {
        let history_turns = request.messages.as_ref().map(|turns| turns.len()).unwrap_or(0);

        serde_json::json!({
            "message": truncate_content(&request.message, 120),
            "history_turns": history_turns,
            "stream": request.is_streaming(),
        })
    }
}
