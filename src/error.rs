//! Crate-wide error type.
//!
//! # Design Decisions
//! - Registration problems (bad pattern, unknown verb) are caller errors and
//!   surface at setup time, before the listener starts
//! - Response protocol violations are returned to the handler and logged
//! - Body decode failures never appear here; the normalizer recovers from them

use thiserror::Error;

/// Errors surfaced by route registration, handlers and the server lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// A route pattern that cannot be compiled into a path matcher.
    #[error("Malformed route pattern {pattern:?}: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// A verb outside GET, POST, PUT and DELETE.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// A response helper was called after the response had been written.
    #[error("Response already sent with status {status}")]
    ResponseAlreadySent { status: u16 },

    /// A structured payload could not be serialized to JSON.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Binding or serving failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Application-level failure reported by a handler.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl Error {
    /// Shorthand for handlers that want to bail out with a message.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
