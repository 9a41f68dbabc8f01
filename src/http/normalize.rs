//! Request body accumulation and decoding.
//!
//! # Responsibilities
//! - Drain the body frame by frame, enforcing the size limit
//! - Decode query strings into parameters
//! - Run the body decode chain: JSON first, then form-encoded
//!
//! # Design Decisions
//! - Decoding is blind: the `Content-Type` header is not consulted
//! - Each stage reports a typed outcome instead of unwinding on failure
//! - A malformed form body leaves the parameter map query-only

use std::collections::HashMap;

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

/// Failure while draining a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

/// Why a decode stage rejected the body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not valid UTF-8")]
    NotUtf8,

    #[error("form pair with empty key")]
    EmptyKey,
}

/// Outcome of the JSON → form decode chain.
#[derive(Debug)]
pub enum BodyDecode {
    /// Nothing was sent.
    Empty,
    /// The body parsed as JSON.
    Json(Value),
    /// JSON failed; the body parsed as `key=value&...` pairs.
    Form(Vec<(String, String)>),
    /// Neither stage accepted the body.
    Undecodable(DecodeError),
}

/// Accumulate `body` into one buffer, failing once more than `limit` bytes arrive.
pub async fn accumulate(mut body: Body, limit: usize) -> Result<Bytes, BodyError> {
    let mut buf = BytesMut::new();

    while let Some(frame) = body.frame().await {
        let frame = frame?;
        if let Ok(chunk) = frame.into_data() {
            if buf.len() + chunk.len() > limit {
                return Err(BodyError::TooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }
    }

    Ok(buf.freeze())
}

/// Parse a query string. Duplicate keys resolve to the last occurrence.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// First decode stage.
pub fn decode_json(raw: &[u8]) -> Result<Value, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

/// Second decode stage.
pub fn decode_form(raw: &[u8]) -> Result<Vec<(String, String)>, DecodeError> {
    if std::str::from_utf8(raw).is_err() {
        return Err(DecodeError::NotUtf8);
    }

    let pairs: Vec<(String, String)> = form_urlencoded::parse(raw).into_owned().collect();
    if pairs.iter().any(|(k, _)| k.is_empty()) {
        return Err(DecodeError::EmptyKey);
    }
    Ok(pairs)
}

/// Run the full chain over an accumulated body.
pub fn decode_body(raw: &[u8]) -> BodyDecode {
    if raw.is_empty() {
        return BodyDecode::Empty;
    }

    let json_err = match decode_json(raw) {
        Ok(value) => return BodyDecode::Json(value),
        Err(e) => e,
    };

    match decode_form(raw) {
        Ok(pairs) => BodyDecode::Form(pairs),
        Err(form_err) => {
            tracing::debug!(json = %json_err, form = %form_err, "Request body not decodable");
            BodyDecode::Undecodable(form_err)
        }
    }
}
