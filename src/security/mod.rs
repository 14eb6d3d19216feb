//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     SecurityConfig
//!     → method_policy.rs (compile global + per-path guards)
//!     → allowed_methods.rs (validate each allowlist)
//!
//! Incoming request:
//!     → method_policy.rs (pick guard for path)
//!     → allowed_methods.rs (evaluate method)
//!     → MethodDecision handed to the HTTP layer (continue or 405)
//! ```
//!
//! # Design Decisions
//! - Fail fast: a misconfigured guard stops startup
//! - Fail closed: unrecognized methods are denied
//! - No trust in client input; evaluation never errors

pub mod allowed_methods;
pub mod method_policy;

pub use allowed_methods::{
    ConfigError, DecisionReason, MethodAllowlist, MethodDecision, MethodGuard, KNOWN_METHODS,
};
pub use method_policy::{MethodPolicy, PolicyError};
