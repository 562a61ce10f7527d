//! Provider wire dialects: endpoints, request bodies, auth, extraction
//!
//! Everything provider-specific lives in the match arms here. The
//! dispatcher never branches on provider identity; adding a provider means
//! one new variant plus one arm per method.

use reqwest::RequestBuilder;
use serde_json::{json, Value};

use crate::models::chat::ChatQuery;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 500;

/// The wire dialect a provider speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenRouter,
    OpenAi,
    Grok,
    Claude,
    Gemini,
}

impl ProviderKind {
    /// Every known kind, in default priority order
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenRouter,
        ProviderKind::OpenAi,
        ProviderKind::Grok,
        ProviderKind::Claude,
        ProviderKind::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Grok => "grok",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "openrouter" => Some(ProviderKind::OpenRouter),
            "openai" => Some(ProviderKind::OpenAi),
            "grok" => Some(ProviderKind::Grok),
            "claude" => Some(ProviderKind::Claude),
            "gemini" => Some(ProviderKind::Gemini),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "https://openrouter.ai",
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Grok => "https://api.x.ai",
            ProviderKind::Claude => "https://api.anthropic.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openai/gpt-4o-mini",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Grok => "grok-2-latest",
            ProviderKind::Claude => "claude-3-haiku-20240307",
            ProviderKind::Gemini => "gemini-1.5-flash",
        }
    }

    /// Static confidence reported when this provider answers. Earlier
    /// providers in the try order carry slightly higher confidence.
    pub fn default_confidence(&self) -> f64 {
        match self {
            ProviderKind::OpenRouter => 0.95,
            ProviderKind::OpenAi => 0.92,
            ProviderKind::Grok => 0.90,
            ProviderKind::Claude => 0.88,
            ProviderKind::Gemini => 0.85,
        }
    }

    /// Build the request URL. Gemini authenticates through a query
    /// parameter, so its secret lands here rather than in a header.
    pub fn endpoint(&self, base_url: &str, model: &str, secret: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            ProviderKind::OpenRouter => format!("{}/api/v1/chat/completions", base),
            ProviderKind::OpenAi | ProviderKind::Grok => {
                format!("{}/v1/chat/completions", base)
            }
            ProviderKind::Claude => format!("{}/v1/messages", base),
            ProviderKind::Gemini => {
                format!("{}/v1beta/models/{}:generateContent?key={}", base, model, secret)
            }
        }
    }

    pub fn apply_auth(&self, request: RequestBuilder, secret: &str) -> RequestBuilder {
        match self {
            ProviderKind::OpenRouter => request
                .header("Authorization", format!("Bearer {}", secret))
                .header("HTTP-Referer", "https://github.com/yourusername/chatrelay")
                .header("X-Title", "chatrelay"),
            ProviderKind::OpenAi | ProviderKind::Grok => {
                request.header("Authorization", format!("Bearer {}", secret))
            }
            ProviderKind::Claude => request
                .header("x-api-key", secret)
                .header("anthropic-version", "2023-06-01"),
            // key travels in the URL
            ProviderKind::Gemini => request,
        }
    }

    pub fn build_body(&self, query: &ChatQuery, model: &str, system_prompt: &str) -> Value {
        match self {
            ProviderKind::OpenRouter | ProviderKind::OpenAi | ProviderKind::Grok => {
                let mut messages = vec![json!({"role": "system", "content": system_prompt})];
                for turn in &query.history {
                    messages.push(json!({"role": turn.role, "content": turn.content}));
                }
                messages.push(json!({"role": "user", "content": query.text}));
                json!({
                    "model": model,
                    "messages": messages,
                    "temperature": DEFAULT_TEMPERATURE,
                    "max_tokens": DEFAULT_MAX_TOKENS,
                })
            }
            ProviderKind::Claude => {
                // the system prompt is a top-level field, not a message
                let mut messages = Vec::new();
                for turn in &query.history {
                    messages.push(json!({"role": turn.role, "content": turn.content}));
                }
                messages.push(json!({"role": "user", "content": query.text}));
                json!({
                    "model": model,
                    "max_tokens": DEFAULT_MAX_TOKENS,
                    "system": system_prompt,
                    "messages": messages,
                })
            }
            ProviderKind::Gemini => {
                // Gemini takes one flattened transcript
                let mut text = String::from(system_prompt);
                for turn in &query.history {
                    text.push_str(&format!("\n{}: {}", turn.role, turn.content));
                }
                text.push_str(&format!("\nuser: {}", query.text));
                json!({
                    "contents": [{"parts": [{"text": text}]}],
                    "generationConfig": {
                        "temperature": DEFAULT_TEMPERATURE,
                        "maxOutputTokens": DEFAULT_MAX_TOKENS,
                    },
                })
            }
        }
    }

    /// Pull the answer text out of a 2xx response body. `None` means the
    /// reply had no usable answer, which counts as a provider failure.
    pub fn extract_answer(&self, body: &Value) -> Option<String> {
        let text = match self {
            ProviderKind::OpenRouter | ProviderKind::OpenAi | ProviderKind::Grok => {
                chat_completions_answer(body)?.to_string()
            }
            ProviderKind::Claude => claude_answer(body)?.to_string(),
            ProviderKind::Gemini => gemini_answer(body)?,
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn chat_completions_answer(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

fn claude_answer(body: &Value) -> Option<&str> {
    body.get("content")?
        .as_array()?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))?
        .get("text")?
        .as_str()
}

fn gemini_answer(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
