//! HTTP middleware components.

/// Account token authentication middleware
pub mod auth;
