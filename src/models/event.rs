//! Stream event model shared by the NDJSON decoder and the chat handlers

use serde_json::{json, Map, Value};

/// Default error code for error events that arrive without one
pub const DEFAULT_ERROR_CODE: &str = "STREAM_ERROR";
const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Typing indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStatus {
    Start,
    Stop,
}

impl TypingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypingStatus::Start => "start",
            TypingStatus::Stop => "stop",
        }
    }

    /// Unknown or missing statuses read as `Start` rather than failing
    /// the whole line.
    fn from_field(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("stop") => TypingStatus::Stop,
            _ => TypingStatus::Start,
        }
    }
}

/// Hashable event name used as the subscription key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Typing,
    Chunk,
    Done,
    Error,
    Abort,
    /// Any other `type` tag, forwarded verbatim
    Other(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "typing" => EventKind::Typing,
            "chunk" => EventKind::Chunk,
            "done" => EventKind::Done,
            "error" => EventKind::Error,
            "abort" => EventKind::Abort,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Typing => "typing",
            EventKind::Chunk => "chunk",
            EventKind::Done => "done",
            EventKind::Error => "error",
            EventKind::Abort => "abort",
            EventKind::Other(name) => name,
        }
    }
}

/// One decoded stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Typing {
        status: TypingStatus,
    },
    Chunk {
        content: String,
        chunk_id: Option<String>,
    },
    Done {
        full_content: String,
        metadata: Map<String, Value>,
    },
    Error {
        code: String,
        message: String,
    },
    Abort,
    /// Unknown event type carried through with its raw payload
    Other {
        kind: String,
        payload: Value,
    },
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Typing { .. } => EventKind::Typing,
            StreamEvent::Chunk { .. } => EventKind::Chunk,
            StreamEvent::Done { .. } => EventKind::Done,
            StreamEvent::Error { .. } => EventKind::Error,
            StreamEvent::Abort => EventKind::Abort,
            StreamEvent::Other { kind, .. } => EventKind::Other(kind.clone()),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        StreamEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build an event from one parsed stream line. A missing `type` field
    /// means `chunk`; unknown types are kept as-is so listeners can still
    /// subscribe to them.
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("chunk")
            .to_string();
        match kind.as_str() {
            "typing" => StreamEvent::Typing {
                status: TypingStatus::from_field(value.get("status")),
            },
            "chunk" => StreamEvent::Chunk {
                content: string_field(&value, "content")
                    .or_else(|| string_field(&value, "delta"))
                    .unwrap_or_default(),
                chunk_id: string_field(&value, "chunk_id"),
            },
            "done" => StreamEvent::Done {
                full_content: string_field(&value, "full_content").unwrap_or_default(),
                metadata: value
                    .get("metadata")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            },
            "error" => StreamEvent::Error {
                code: string_field(&value, "code")
                    .unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string()),
                message: string_field(&value, "error")
                    .or_else(|| string_field(&value, "message"))
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            },
            "abort" => StreamEvent::Abort,
            _ => StreamEvent::Other {
                kind,
                payload: value,
            },
        }
    }

    /// Serialize for the wire, the inverse of [`StreamEvent::from_value`]
    pub fn to_value(&self) -> Value {
        match self {
            StreamEvent::Typing { status } => {
                json!({"type": "typing", "status": status.as_str()})
            }
            StreamEvent::Chunk { content, chunk_id } => {
                let mut value = json!({"type": "chunk", "content": content});
                if let Some(id) = chunk_id {
                    value["chunk_id"] = json!(id);
                }
                value
            }
            StreamEvent::Done {
                full_content,
                metadata,
            } => json!({
                "type": "done",
                "full_content": full_content,
                "metadata": metadata,
            }),
            StreamEvent::Error { code, message } => {
                json!({"type": "error", "code": code, "error": message})
            }
            StreamEvent::Abort => json!({"type": "abort"}),
            StreamEvent::Other { kind, payload } => {
                let mut value = payload.clone();
                if let Some(object) = value.as_object_mut() {
                    object.insert("type".to_string(), json!(kind));
                }
                value
            }
        }
    }
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_type_defaults_to_chunk() {
        let event = StreamEvent::from_value(json!({"content": "hi"}));
        assert_eq!(
            event,
            StreamEvent::Chunk {
                content: "hi".to_string(),
                chunk_id: None,
            }
        );
    }

    #[test]
    fn test_chunk_falls_back_to_delta() {
        let event = StreamEvent::from_value(json!({"type": "chunk", "delta": "partial"}));
        assert_eq!(
            event,
            StreamEvent::Chunk {
                content: "partial".to_string(),
                chunk_id: None,
            }
        );
    }

    #[test]
    fn test_unknown_type_forwarded_verbatim() {
        let event = StreamEvent::from_value(json!({"type": "usage", "tokens": 42}));
        match &event {
            StreamEvent::Other { kind, payload } => {
                assert_eq!(kind, "usage");
                assert_eq!(payload["tokens"], 42);
            }
            other => panic!("expected Other, got {:?}", other),
        }
        assert_eq!(event.kind(), EventKind::Other("usage".to_string()));
        assert_eq!(event.to_value()["type"], "usage");
        assert_eq!(event.to_value()["tokens"], 42);
    }

    #[test]
    fn test_done_metadata_defaults_empty() {
        let event = StreamEvent::from_value(json!({"type": "done", "full_content": "x"}));
        match event {
            StreamEvent::Done {
                full_content,
                metadata,
            } => {
                assert_eq!(full_content, "x");
                assert!(metadata.is_empty());
            }
            other => panic!("expected Done, got {:?}", other),
        }
    }

    #[test]
    fn test_error_defaults() {
        let event = StreamEvent::from_value(json!({"type": "error"}));
        assert_eq!(
            event,
            StreamEvent::Error {
                code: "STREAM_ERROR".to_string(),
                message: "An error occurred".to_string(),
            }
        );

        let with_message = StreamEvent::from_value(json!({"type": "error", "error": "boom"}));
        match with_message {
            StreamEvent::Error { message, .. } => assert_eq!(message, "boom"),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn test_typing_status_parse() {
        let stop = StreamEvent::from_value(json!({"type": "typing", "status": "stop"}));
        assert_eq!(
            stop,
            StreamEvent::Typing {
                status: TypingStatus::Stop
            }
        );
        // missing status reads as start
        let bare = StreamEvent::from_value(json!({"type": "typing"}));
        assert_eq!(
            bare,
            StreamEvent::Typing {
                status: TypingStatus::Start
            }
        );
    }

    #[test]
    fn test_event_kind_round_trip() {
        assert_eq!(EventKind::from_name("done"), EventKind::Done);
        assert_eq!(EventKind::from_name("custom").as_str(), "custom");
    }
}
