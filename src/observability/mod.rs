//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Method guard middleware produces:
//!     → logging.rs (structured log events per decision)
//!     → metrics.rs (decision and request counters, latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The guard itself stays pure; the caller logs and counts decisions
//! - Request ID is attached to every decision log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
