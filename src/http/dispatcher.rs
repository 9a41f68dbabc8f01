//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve method + path to exactly one handler
//! - Pass captured path segments in pattern order
//! - Fall back to the error handler, or a plain 404 when none is registered
//! - Make sure every request ends with a written response
//!
//! # Design Decisions
//! - Handlers see a fully normalized request and may await freely
//! - No retries, no chaining: one handler invocation per request
//! - A handler that fails or writes nothing yields 500, and is logged

use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::handler::{ErrorHandler, Handler, HandlerResult};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::observability::metrics::Outcome;
use crate::routing::{Method, RouteTable};

/// Immutable routing state shared by all connections.
pub struct Dispatcher {
    table: RouteTable<Handler>,
    error_handler: Option<ErrorHandler>,
}

impl Dispatcher {
    pub fn new(table: RouteTable<Handler>, error_handler: Option<ErrorHandler>) -> Self {
        Self {
            table,
            error_handler,
        }
    }

    pub fn table(&self) -> &RouteTable<Handler> {
        &self.table
    }

    /// Run the matching handler for `request` and return its reply.
    pub async fn dispatch(&self, request: Request) -> (Response, Outcome) {
        let request = Arc::new(request);

        let matched = Method::from_http(request.method())
            .and_then(|method| self.table.lookup(method, request.path()));

        if let Some(m) = matched {
            tracing::debug!(
                method = %request.method(),
                path = %request.path(),
                pattern = %m.route.pattern.source(),
                captures = m.captures.len(),
                "Route matched"
            );
            let handler = Arc::clone(m.handler());
            let (mut response, result) =
                handler(Arc::clone(&request), Response::new(), m.captures).await;
            finish(&request, &mut response, result);
            return (response, Outcome::Matched);
        }

        tracing::warn!(method = %request.method(), path = %request.path(), "No route matched");

        match &self.error_handler {
            Some(handler) => {
                let (mut response, result) = handler(Arc::clone(&request), Response::new()).await;
                finish(&request, &mut response, result);
                (response, Outcome::ErrorHandler)
            }
            None => {
                let mut response = Response::new();
                write_fallback(&mut response, StatusCode::NOT_FOUND, "Not Found");
                (response, Outcome::NotFound)
            }
        }
    }
}

/// Turn handler failures and silent handlers into a 500.
fn finish(request: &Request, response: &mut Response, result: HandlerResult) {
    match result {
        Ok(()) if response.is_sent() => {}
        Ok(()) => {
            tracing::warn!(path = %request.path(), "Handler returned without writing a response");
            write_fallback(response, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
        Err(e) => {
            tracing::error!(path = %request.path(), error = %e, "Handler failed");
            if !response.is_sent() {
                write_fallback(response, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        }
    }
}

fn write_fallback(response: &mut Response, status: StatusCode, message: &str) {
    if let Err(e) = response.plain(message, Some(status)) {
        tracing::error!(error = %e, "Failed to write fallback response");
    }
}
