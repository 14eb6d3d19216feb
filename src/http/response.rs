//! Responses produced by the gate itself.
//!
//! # Design Decisions
//! - Rejections use 405 and always carry an `Allow` header
//! - Bodies are small JSON documents naming the decision reason
//! - The rejected method is not echoed back to the client

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::security::allowed_methods::{DecisionReason, MethodAllowlist, MethodDecision};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectionBody {
    status_code: u16,
    status_message: &'static str,
    reason: DecisionReason,
}

/// 405 response for a denied decision.
pub fn method_not_allowed(allowlist: &MethodAllowlist, decision: &MethodDecision) -> Response {
    let body = RejectionBody {
        status_code: StatusCode::METHOD_NOT_ALLOWED.as_u16(),
        status_message: "Method not allowed",
        reason: decision.reason,
    };

    let mut response = (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response();
    if let Ok(allow) = HeaderValue::from_str(&allowlist.to_string()) {
        response.headers_mut().insert(header::ALLOW, allow);
    }
    response
}
