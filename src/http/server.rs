//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the application handler
//! - Wire up middleware (tracing, request ID, timeout, method gate)
//! - Serve until shutdown is signalled
//! - Apply reloaded method policies without dropping connections

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::any,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::loader::LoadError;
use crate::config::schema::GatewayConfig;
use crate::http::middleware::{allowed_methods_middleware, MethodGateState};
use crate::http::request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::security::allowed_methods::MethodDecision;
use crate::security::method_policy::MethodPolicy;

/// HTTP server hosting the application behind the method gate.
pub struct HttpServer {
    router: Router,
    gate: MethodGateState,
}

impl HttpServer {
    /// Create a new HTTP server.
    ///
    /// Fails if the method policy does not compile. Listener, timeout and
    /// metrics settings are expected to have passed `validate_config`
    /// already (`load_config` does this).
    pub fn new(config: GatewayConfig) -> Result<Self, LoadError> {
        let policy = MethodPolicy::from_config(&config.security).map_err(|errors| {
            LoadError::Validation(errors.into_iter().map(Into::into).collect())
        })?;
        log_policy(policy.as_ref());

        let gate = MethodGateState::new(policy);
        let router = Self::build_router(&config, gate.clone());

        Ok(Self { router, gate })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, gate: MethodGateState) -> Router {
        Router::new()
            .route("/", any(echo_handler))
            .route("/{*path}", any(echo_handler))
            .layer(middleware::from_fn_with_state(gate, allowed_methods_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_request))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Run the server on `listener`.
    ///
    /// Configs received on `config_updates` replace the method policy; the
    /// server stops once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let gate = self.gate.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_reload(&gate, &config);
            }
        });

        let shutdown_signal = async move {
            match shutdown.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    tracing::info!("Shutdown signal received");
                }
                // Nobody left to trigger shutdown; serve until killed.
                Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
            }
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered application, for in-process use.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Compile and install the security section of a reloaded config.
/// An invalid policy is logged and the running one is kept.
fn apply_reload(gate: &MethodGateState, config: &GatewayConfig) {
    match MethodPolicy::from_config(&config.security) {
        Ok(policy) => {
            log_policy(policy.as_ref());
            gate.install(policy);
            metrics::record_policy_reload(true);
            tracing::info!("Method policy reloaded");
        }
        Err(errors) => {
            for e in &errors {
                tracing::error!(error = %e, "Invalid method policy in reloaded config");
            }
            metrics::record_policy_reload(false);
        }
    }
}

fn log_policy(policy: Option<&MethodPolicy>) {
    let Some(policy) = policy else {
        tracing::info!("Method gate not configured, all methods pass");
        return;
    };

    match policy.global() {
        Some(guard) => tracing::info!(allowed = %guard.allowlist(), "Global method allowlist"),
        None => tracing::info!("No global method allowlist, only route rules apply"),
    }
    for (prefix, guard) in policy.rules() {
        match guard {
            Some(guard) => tracing::info!(path_prefix = prefix, allowed = %guard.allowlist(), "Route method rule"),
            None => tracing::info!(path_prefix = prefix, "Route method rule disables enforcement"),
        }
    }
}

async fn track_request(req: Request<Body>, next: middleware::Next) -> axum::response::Response {
    let start = Instant::now();
    let method = req.method().clone();
    let response = next.run(req).await;
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

#[derive(Debug, Serialize)]
struct EchoResponse {
    method: String,
    path: String,
    request_id: String,
    decision: Option<MethodDecision>,
}

/// Application stand-in: reports what reached it.
async fn echo_handler(request: Request<Body>) -> Json<EchoResponse> {
    Json(EchoResponse {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        request_id: request.request_id().to_string(),
        decision: request.extensions().get::<MethodDecision>().cloned(),
    })
}
