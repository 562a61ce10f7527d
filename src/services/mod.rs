//! Service layer module
//!
//! Contains the outbound HTTP client and the provider dispatcher

pub mod client;
pub mod dispatcher;

pub use client::ProviderClient;
pub use dispatcher::ProviderDispatcher;
