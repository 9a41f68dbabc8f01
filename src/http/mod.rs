//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, single fallback entry point)
//!     → request_id.rs (assign x-request-id)
//!     → normalize.rs (drain body, decode query, JSON → form chain)
//!     → request.rs (finalized Request)
//!     → dispatcher.rs (route lookup, handler invocation)
//!     → handler.rs (sync or async user handler)
//!     → response.rs (one reply per request)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod handler;
pub mod normalize;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;

pub use dispatcher::Dispatcher;
pub use handler::{ErrorHandler, Handler, HandlerResult, Reply};
pub use request::{Body, Request};
pub use request_id::{UuidRequestId, X_REQUEST_ID};
pub use response::{Payload, Response, APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
pub use server::{Server, ServerHandle};
