//! Data models module
//!
//! Defines the chat wire types and the stream event model

pub mod chat;
pub mod event;

pub use chat::{ChatQuery, ChatRequest, ChatTurn, DispatchResult, TYPE_AI_RESPONSE, TYPE_FALLBACK};
pub use event::{EventKind, StreamEvent, TypingStatus};
