//! Response helpers for route handlers.
//!
//! # Responsibilities
//! - Record exactly one reply (status, content type, body) per request
//! - Serialize structured payloads to JSON
//! - Report attempts to reply twice
//!
//! # Design Decisions
//! - A structured payload always goes out as `application/json`, whatever
//!   content type the caller passed
//! - The first write wins; later writes return `ResponseAlreadySent`
//! - Default status is 200, default content type `text/html`

use axum::body::Body as HttpBody;
use axum::http::{header, HeaderValue, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const TEXT_HTML: &str = "text/html";
pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Something a handler can reply with.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sent verbatim.
    Text(String),
    /// Serialized to JSON on send.
    Json(Value),
}

impl Payload {
    /// Structured payload from any serializable value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// A reply that has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sent {
    status: StatusCode,
    content_type: String,
    body: String,
}

/// Outgoing response handed to handlers.
#[derive(Debug, Default)]
pub struct Response {
    sent: Option<Sent>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the reply.
    ///
    /// `status` defaults to 200 and `content_type` to `text/html`. A
    /// [`Payload::Json`] body forces `application/json`.
    pub fn send(
        &mut self,
        body: impl Into<Payload>,
        status: Option<StatusCode>,
        content_type: Option<&str>,
    ) -> Result<()> {
        if let Some(sent) = &self.sent {
            tracing::error!(
                status = sent.status.as_u16(),
                "Response helper called after the response was sent"
            );
            return Err(Error::ResponseAlreadySent {
                status: sent.status.as_u16(),
            });
        }

        let (body, content_type) = match body.into() {
            Payload::Text(text) => (text, content_type.unwrap_or(TEXT_HTML)),
            Payload::Json(value) => (serde_json::to_string(&value)?, APPLICATION_JSON),
        };

        self.sent = Some(Sent {
            status: status.unwrap_or(StatusCode::OK),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }

    /// Reply with `text/html`.
    pub fn html(&mut self, body: impl Into<Payload>, status: Option<StatusCode>) -> Result<()> {
        self.send(body, status, Some(TEXT_HTML))
    }

    /// Reply with `text/plain`.
    pub fn plain(&mut self, body: impl Into<Payload>, status: Option<StatusCode>) -> Result<()> {
        self.send(body, status, Some(TEXT_PLAIN))
    }

    /// Reply with `application/json`. Text is assumed to already be JSON.
    pub fn json(&mut self, body: impl Into<Payload>, status: Option<StatusCode>) -> Result<()> {
        self.send(body, status, Some(APPLICATION_JSON))
    }

    pub fn is_sent(&self) -> bool {
        self.sent.is_some()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.sent.as_ref().map(|s| s.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.sent.as_ref().map(|s| s.content_type.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.sent.as_ref().map(|s| s.body.as_str())
    }

    /// Convert into a host response; `None` if nothing was written.
    pub(crate) fn into_http(self) -> Option<axum::response::Response> {
        let sent = self.sent?;

        let mut response = axum::response::Response::new(HttpBody::from(sent.body));
        *response.status_mut() = sent.status;
        match HeaderValue::from_str(&sent.content_type) {
            Ok(value) => {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Err(_) => {
                tracing::warn!(content_type = %sent.content_type, "Invalid content type dropped");
            }
        }
        Some(response)
    }
}
