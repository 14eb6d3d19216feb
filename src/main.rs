//! method-gate
//!
//! Serves an application behind an HTTP method allowlist.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     METHOD GATE                       │
//!                     │                                                       │
//!   Client Request    │  ┌────────────┐   ┌──────────────┐   ┌─────────────┐  │
//!   ──────────────────┼─▶│ request id │──▶│ method policy│──▶│ application │  │
//!                     │  │  + trace   │   │   + guard    │   │   handler   │  │
//!                     │  └────────────┘   └──────┬───────┘   └─────────────┘  │
//!                     │                          │ denied                     │
//!   ◀─────────────────┼──────────────────── 405 + Allow                       │
//!                     │                                                       │
//!                     │  config (TOML, hot reload) · logging · metrics        │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use method_gate::lifecycle::{load_startup_config, serve};
use method_gate::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "method-gate")]
#[command(about = "Serve an application behind an HTTP method allowlist", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_startup_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("method-gate: refusing to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        println!("configuration OK");
        return ExitCode::SUCCESS;
    }

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "method-gate starting"
    );

    match serve(config, cli.config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
