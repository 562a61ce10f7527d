//! Configuration management module
//!
//! Responsible for loading and managing application configuration, including environment variables, configuration files, etc.

pub mod file;
pub mod settings;

pub use file::{OverridesFile, ProviderOverride};
pub use settings::Settings;
