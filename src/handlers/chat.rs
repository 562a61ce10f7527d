//! Chat endpoint handlers
//!
//! Dispatches chat requests across providers and returns either a single
//! JSON result or a chunked NDJSON stream

use crate::handlers::AppState;
use crate::models::{ChatQuery, ChatRequest, StreamEvent, TypingStatus};
use crate::utils::error::{helpers, AppError, AppResult};
use crate::utils::logging::chat_request_log_summary;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Target size in bytes for one streamed chunk
const CHUNK_LEN: usize = 48;

/// Handle chat requests
///
/// POST /api/chat
///
/// Returns a single JSON result, or an NDJSON stream when the request
/// sets `"stream": true`.
pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(chat_request): Json<ChatRequest>,
) -> AppResult<Response> {
    // 🔍 DEBUG: log a request summary
    let log_summary = chat_request_log_summary(&chat_request);
    if let Ok(summary_json) = serde_json::to_string_pretty(&log_summary) {
        debug!("📥 Chat request:\n{}", summary_json);
    }

    if chat_request.message.trim().is_empty() {
        return Err(helpers::validation_error("message cannot be empty"));
    }

    let query = ChatQuery::from_request(&chat_request, state.settings.dispatch.max_history);

    if chat_request.is_streaming() {
        stream_response(state, query).await
    } else {
        let result = state.dispatcher.dispatch(&query).await;
        info!("Answered from {} in {}ms", result.source, result.processing_time);
        Ok(Json(result).into_response())
    }
}

/// Handle streaming requests
///
/// Runs the dispatch on a background task and feeds the result to the
/// client as NDJSON lines: typing, the answer re-chunked, then done.
async fn stream_response(state: Arc<AppState>, query: ChatQuery) -> AppResult<Response> {
    let dispatcher = state.dispatcher.clone();
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<String, std::io::Error>>(100);

    tokio::spawn(async move {
        let typing = StreamEvent::Typing {
            status: TypingStatus::Start,
        };
        if tx.send(Ok(encode_line(&typing))).await.is_err() {
            debug!("Client disconnected before dispatch");
            return;
        }

        let result = dispatcher.dispatch(&query).await;

        for (index, piece) in chunk_answer(&result.answer, CHUNK_LEN).into_iter().enumerate() {
            let chunk = StreamEvent::Chunk {
                content: piece,
                chunk_id: Some(index.to_string()),
            };
            if tx.send(Ok(encode_line(&chunk))).await.is_err() {
                debug!("Client disconnected during stream");
                return;
            }
        }

        let mut metadata = Map::new();
        if let Some(model) = &result.model {
            metadata.insert("model".to_string(), Value::String(model.clone()));
        }
        metadata.insert("source".to_string(), Value::String(result.source.clone()));
        metadata.insert("confidence".to_string(), result.confidence.into());

        let done = StreamEvent::Done {
            full_content: result.answer.clone(),
            metadata,
        };
        let _ = tx.send(Ok(encode_line(&done))).await;
    });

    let stream = ReceiverStream::new(rx);

    debug!("Starting streaming response transmission");
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize one event as an NDJSON line
fn encode_line(event: &StreamEvent) -> String {
    let mut line = event.to_value().to_string();
    line.push('\n');
    line
}

/// Split an answer into chunks of roughly `max_len` bytes, breaking only
/// at word boundaries so no chunk ends mid-word.
pub fn chunk_answer(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in text.split_inclusive(' ') {
        if !current.is_empty() && current.len() + piece.len() > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Provider status entry for GET /api/providers
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
    pub priority: u8,
    pub model: String,
    pub confidence: f64,
}

/// Response for GET /api/providers
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderStatus>,
    #[serde(rename = "fallbackConfidence")]
    pub fallback_confidence: f64,
}

/// List configured providers in dispatch order
///
/// GET /api/providers
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    let providers = state
        .dispatcher
        .catalog()
        .specs()
        .iter()
        .map(|spec| ProviderStatus {
            name: spec.name.clone(),
            enabled: spec.enabled(),
            priority: spec.priority,
            model: spec.model.clone(),
            confidence: spec.confidence,
        })
        .collect();

    Json(ProvidersResponse {
        providers,
        fallback_confidence: state.settings.dispatch.fallback_confidence,
    })
}
