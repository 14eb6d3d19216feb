//! HTTP method allowlist gate.
//!
//! Rejects requests whose method is not on a configured allowlist with
//! `405 Method Not Allowed` before they reach application logic.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::{ConfigError, DecisionReason, MethodDecision, MethodGuard, MethodPolicy};
