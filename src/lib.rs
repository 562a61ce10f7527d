//! Chat Relay Library
//!
//! Dispatches chat requests across LLM providers with silent fallback and
//! decodes streamed NDJSON responses incrementally

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod services;
pub mod stream;
pub mod utils;

// Re-export common types
pub use config::{OverridesFile, Settings};
pub use handlers::{create_router, AppState};
pub use models::{ChatQuery, ChatRequest, DispatchResult, EventKind, StreamEvent};
pub use providers::{ProviderCatalog, ProviderKind, ProviderSpec};
pub use services::{ProviderClient, ProviderDispatcher};
pub use stream::{CancelHandle, StreamChannel, StreamDecoder};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
