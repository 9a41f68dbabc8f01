//! Normalized request handed to route handlers.
//!
//! # Responsibilities
//! - Collect query parameters when the request head arrives
//! - Fold the decoded body into the parameter map or the structured body
//! - Expose a read-only view to handlers once normalization is complete
//!
//! # Design Decisions
//! - A JSON body is exposed as a structured value and never flattened into
//!   the parameter map
//! - Form pairs are merged after the query string, overwriting same-named keys
//! - `param` returns `Option`, so an empty value is distinct from absence

use std::collections::HashMap;

use axum::http::{request::Parts, HeaderMap, Method, Uri};
use bytes::Bytes;
use serde_json::Value;

use crate::http::normalize::{decode_body, parse_query, BodyDecode};
use crate::http::request_id::X_REQUEST_ID;

/// The request body after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body bytes were sent.
    Empty,
    /// The body parsed as JSON.
    Json(Value),
    /// Non-JSON text (form pairs, if any, are in the parameter map).
    Text(String),
    /// Bytes that are not UTF-8.
    Binary(Bytes),
}

/// A fully drained and decoded request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Body,
}

impl Request {
    /// Build a request from its head and accumulated body.
    pub fn normalize(parts: Parts, raw: Bytes) -> Self {
        let mut params = parts.uri.query().map(parse_query).unwrap_or_default();

        let body = match decode_body(&raw) {
            BodyDecode::Empty => Body::Empty,
            BodyDecode::Json(value) => Body::Json(value),
            BodyDecode::Form(pairs) => {
                params.extend(pairs);
                text_or_binary(raw)
            }
            BodyDecode::Undecodable(_) => text_or_binary(raw),
        };

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
        }
    }

    /// Raw request method, including verbs no route can be registered for.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request target as received (path and query).
    pub fn url(&self) -> String {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| self.uri.path().to_string())
    }

    /// Path component, query string stripped.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Correlation ID assigned by the request-id layer.
    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// Look up a query or form parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All query and form parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Structured body, when the body was JSON.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Body text, when the body was non-JSON UTF-8.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn text_or_binary(raw: Bytes) -> Body {
    match String::from_utf8(raw.to_vec()) {
        Ok(text) => Body::Text(text),
        Err(_) => Body::Binary(raw),
    }
}
