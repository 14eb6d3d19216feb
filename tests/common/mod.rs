//! Shared utilities for integration tests.

use std::net::SocketAddr;

use method_gate::config::GatewayConfig;
use method_gate::http::HttpServer;
use method_gate::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A gate serving on an ephemeral local port.
pub struct RunningGate {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
    #[allow(dead_code)]
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config bound to localhost with metrics off.
pub fn test_config(allowed: Option<&[&str]>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config.security.allowed_methods_restricter =
        allowed.map(|methods| methods.iter().map(|m| m.to_string()).collect());
    config
}

/// Start the gate. The listener is bound before this returns.
pub async fn start_gate(config: GatewayConfig) -> RunningGate {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).expect("test config must be valid");
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, config_updates) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move { server.run(listener, config_updates, server_shutdown).await });

    RunningGate {
        addr,
        shutdown,
        updates,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
