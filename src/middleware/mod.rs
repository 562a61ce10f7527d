//! Middleware module
//!
//! Request-level middleware applied to the router

pub mod logging;
