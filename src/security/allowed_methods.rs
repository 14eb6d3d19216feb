//! HTTP method allowlist guard.
//!
//! # Responsibilities
//! - Validate the configured method list once, at startup
//! - Decide per request whether the method may reach the application
//!
//! # Design Decisions
//! - Configuration is case-insensitive; stored tokens are uppercase
//! - Unknown configured methods are rejected, never silently enforced
//! - Evaluation is total: any string yields a decision, never an error
//! - The guard is immutable after construction and shared without locks

use std::fmt;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;

/// Registered HTTP method tokens a guard may be configured with.
pub const KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// Startup-time failure while building a guard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No usable entries once blank values are dropped.
    #[error("method allowlist is empty; at least one HTTP method is required")]
    Empty,

    /// An entry that is not a registered HTTP method.
    #[error(
        "unknown HTTP method {value:?} (expected one of GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS, CONNECT, TRACE)"
    )]
    UnknownMethod { value: String },
}

/// Validated, deduplicated set of permitted methods.
///
/// Source order is kept so the `Allow` header and logs read the way the
/// operator wrote the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodAllowlist {
    methods: Vec<Method>,
}

impl MethodAllowlist {
    /// Parse raw configured tokens.
    pub fn parse<I, S>(raw: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut methods: Vec<Method> = Vec::new();

        for entry in raw {
            let entry = entry.as_ref();
            let token = normalize(entry);
            if token.is_empty() {
                continue;
            }

            let method = KNOWN_METHODS
                .iter()
                .find(|m| m.as_str() == token)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownMethod {
                    value: entry.to_string(),
                })?;

            if !methods.contains(&method) {
                methods.push(method);
            }
        }

        if methods.is_empty() {
            return Err(ConfigError::Empty);
        }

        Ok(Self { methods })
    }

    /// Permitted methods in configuration order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Exact membership test against a normalized token.
    pub fn contains(&self, token: &str) -> bool {
        self.methods.iter().any(|m| m.as_str() == token)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Renders as an `Allow` header value, e.g. `GET, POST`.
impl fmt::Display for MethodAllowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(method.as_str())?;
        }
        Ok(())
    }
}

/// Why a request was let through or stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionReason {
    MethodAllowed,
    MethodNotAllowed,
    MethodUnrecognized,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::MethodAllowed => "METHOD_ALLOWED",
            DecisionReason::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            DecisionReason::MethodUnrecognized => "METHOD_UNRECOGNIZED",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one request method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecision {
    pub allowed: bool,
    pub requested_method: String,
    pub reason: DecisionReason,
}

/// Allowlist guard evaluated once per inbound request.
#[derive(Debug, Clone)]
pub struct MethodGuard {
    allowlist: MethodAllowlist,
}

impl MethodGuard {
    /// Build a guard from the raw configured method list.
    pub fn create<I, S>(raw_methods: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowlist = MethodAllowlist::parse(raw_methods)?;
        Ok(Self { allowlist })
    }

    pub fn allowlist(&self) -> &MethodAllowlist {
        &self.allowlist
    }

    /// Decide whether `request_method`, as received on the wire, is permitted.
    pub fn evaluate(&self, request_method: &str) -> MethodDecision {
        let token = normalize(request_method);

        let reason = if !is_method_token(&token) {
            DecisionReason::MethodUnrecognized
        } else if self.allowlist.contains(&token) {
            DecisionReason::MethodAllowed
        } else {
            DecisionReason::MethodNotAllowed
        };

        MethodDecision {
            allowed: reason == DecisionReason::MethodAllowed,
            requested_method: token,
            reason,
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Method tokens are restricted to ASCII letters.
fn is_method_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphabetic())
}
