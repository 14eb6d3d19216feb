//! Method allowlist middleware.
//! Enforces the configured method policy before requests reach the application.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::http::request::RequestIdExt;
use crate::http::response::method_not_allowed;
use crate::observability::metrics;
use crate::security::method_policy::MethodPolicy;

/// State required for method enforcement.
///
/// The policy slot is swapped wholesale on reload; each request works
/// against the snapshot it loaded.
#[derive(Clone, Default)]
pub struct MethodGateState {
    pub policy: Arc<ArcSwapOption<MethodPolicy>>,
}

impl MethodGateState {
    pub fn new(policy: Option<MethodPolicy>) -> Self {
        Self {
            policy: Arc::new(ArcSwapOption::from(policy.map(Arc::new))),
        }
    }

    /// Replace the active policy.
    pub fn install(&self, policy: Option<MethodPolicy>) {
        self.policy.store(policy.map(Arc::new));
    }
}

pub async fn allowed_methods_middleware(
    State(state): State<MethodGateState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // 1. No policy installed: passthrough.
    let Some(policy) = state.policy.load_full() else {
        return next.run(req).await;
    };

    // 2. No guard for this path (disabled rule, or rules only): passthrough.
    let Some(guard) = policy.guard_for(req.uri().path()) else {
        return next.run(req).await;
    };

    let decision = guard.evaluate(req.method().as_str());
    metrics::record_decision(&decision);

    if decision.allowed {
        debug!(
            request_id = %req.request_id(),
            method = %decision.requested_method,
            path = %req.uri().path(),
            "Method allowed"
        );
        // Handlers may read the decision.
        req.extensions_mut().insert(decision);
        next.run(req).await
    } else {
        warn!(
            request_id = %req.request_id(),
            method = %decision.requested_method,
            path = %req.uri().path(),
            reason = %decision.reason,
            allowed = %guard.allowlist(),
            "Method rejected"
        );
        method_not_allowed(guard.allowlist(), &decision)
    }
}
