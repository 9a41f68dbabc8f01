//! Metrics collection.
//!
//! # Metrics
//! - `waypost_requests_total` (counter): requests by method, outcome, status
//! - `waypost_request_duration_seconds` (histogram): dispatch latency by method, outcome
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; with no recorder installed the
//!   calls are no-ops
//! - Outcome and method labels are small closed sets; verbs no route can be
//!   registered for are all reported as `OTHER`

use std::time::Instant;

use axum::http;

use crate::routing::Method;

/// How a request left the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A registered route handled it.
    Matched,
    /// No route matched; the user error handler ran.
    ErrorHandler,
    /// No route matched and no error handler was registered.
    NotFound,
    /// Rejected before dispatch (body too large, unreadable body).
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Matched => "matched",
            Outcome::ErrorHandler => "error_handler",
            Outcome::NotFound => "not_found",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Bounded `method` label for a request method.
pub fn method_label(method: &http::Method) -> &'static str {
    Method::from_http(method).map_or("OTHER", |m| m.as_str())
}

/// Record a finished request.
pub fn record_request(method: &'static str, outcome: Outcome, status: u16, start: Instant) {
    let duration = start.elapsed().as_secs_f64();

    ::metrics::counter!(
        "waypost_requests_total",
        "method" => method,
        "outcome" => outcome.as_str(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "waypost_request_duration_seconds",
        "method" => method,
        "outcome" => outcome.as_str()
    )
    .record(duration);
}
