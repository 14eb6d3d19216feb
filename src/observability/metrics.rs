//! Metrics collection and exposition.
//!
//! # Metrics
//! - `method_gate_decisions_total` (counter): guard outcomes by reason, method
//! - `method_gate_requests_total` (counter): responses by method, status
//! - `method_gate_request_duration_seconds` (histogram): latency distribution
//! - `method_gate_policy_reloads_total` (counter): reload attempts by result

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::security::allowed_methods::MethodDecision;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one guard decision.
pub fn record_decision(decision: &MethodDecision) {
    counter!(
        "method_gate_decisions_total",
        "reason" => decision.reason.as_str(),
        "method" => method_label(&decision.requested_method)
    )
    .increment(1);
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method_label(method);
    counter!(
        "method_gate_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("method_gate_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_policy_reload(success: bool) {
    let result = if success { "applied" } else { "rejected" };
    counter!("method_gate_policy_reloads_total", "result" => result).increment(1);
}

/// Method tokens are client-controlled; keep label cardinality bounded.
fn method_label(method: &str) -> &'static str {
    KNOWN_METHOD_LABELS
        .iter()
        .find(|label| **label == method)
        .copied()
        .unwrap_or("OTHER")
}

const KNOWN_METHOD_LABELS: [&str; 9] = [
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "CONNECT", "TRACE",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::allowed_methods::{MethodGuard, KNOWN_METHODS};

    #[test]
    fn test_method_label_buckets_untrusted_tokens() {
        assert_eq!(method_label("GET"), "GET");
        assert_eq!(method_label("TRACE"), "TRACE");
        assert_eq!(method_label("PÔST"), "OTHER");
        assert_eq!(method_label("PROPFIND"), "OTHER");
        assert_eq!(method_label(&"A".repeat(40)), "OTHER");
    }

    #[test]
    fn test_labels_line_up_with_known_methods() {
        for (method, label) in KNOWN_METHODS.iter().zip(KNOWN_METHOD_LABELS) {
            assert_eq!(method.as_str(), label);
        }
    }

    /// The rendered sample line for `name` carrying every label in `labels`.
    fn sample<'a>(rendered: &'a str, name: &str, labels: &[&str]) -> Option<&'a str> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter(|line| line.starts_with(&format!("{name}{{")))
            .find(|line| labels.iter().all(|label| line.contains(label)))
    }

    #[test]
    fn test_counters_carry_bounded_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let guard = MethodGuard::create(["POST"]).unwrap();

        metrics::with_local_recorder(&recorder, || {
            record_request("GET", 405, Instant::now());
            record_request("PROPFIND", 405, Instant::now());
            record_decision(&guard.evaluate("get"));
            record_decision(&guard.evaluate("G3T"));
            record_policy_reload(false);
        });
        let rendered = handle.render();

        let line = sample(
            &rendered,
            "method_gate_requests_total",
            &[r#"method="GET""#, r#"status="405""#],
        )
        .unwrap();
        assert!(line.ends_with(" 1"), "{line}");
        assert!(sample(&rendered, "method_gate_requests_total", &[r#"method="OTHER""#]).is_some());
        assert!(!rendered.contains("PROPFIND"));

        assert!(sample(
            &rendered,
            "method_gate_decisions_total",
            &[r#"reason="METHOD_NOT_ALLOWED""#, r#"method="GET""#],
        )
        .is_some());
        assert!(sample(
            &rendered,
            "method_gate_decisions_total",
            &[r#"reason="METHOD_UNRECOGNIZED""#, r#"method="OTHER""#],
        )
        .is_some());

        let reload = sample(
            &rendered,
            "method_gate_policy_reloads_total",
            &[r#"result="rejected""#],
        )
        .unwrap();
        assert!(reload.ends_with(" 1"), "{reload}");
        assert!(rendered.contains("method_gate_request_duration_seconds"));
    }
}
