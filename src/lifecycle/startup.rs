//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize metrics, the HTTP server and the config watcher in order
//! - Bind the listener last and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is served
//! - Listener binds only after the method policy compiled

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::loader::{load_config, LoadError};
use crate::config::schema::GatewayConfig;
use crate::config::validation::validate_config;
use crate::config::watcher::ConfigWatcher;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::wait_for_shutdown;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
}

/// Load the config at `path`, or validated defaults when no path is given.
pub fn load_startup_config(path: Option<&Path>) -> Result<GatewayConfig, LoadError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = GatewayConfig::default();
            validate_config(&config).map_err(LoadError::Validation)?;
            Ok(config)
        }
    }
}

/// Serve `config` until SIGINT/SIGTERM. `config_path` enables hot reload.
pub async fn serve(config: GatewayConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let (_watcher, config_updates) = match config_path.as_deref() {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;
    tracing::info!(address = %bind_address, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        shutdown.trigger();
    });

    server
        .run(listener, config_updates, server_shutdown)
        .await
        .map_err(StartupError::Serve)
}
