//! Minimal HTTP request router.
//!
//! Register handlers per verb and `:name` pattern, then listen:
//!
//! ```no_run
//! use waypost::Server;
//!
//! # async fn run() -> waypost::Result<()> {
//! let mut server = Server::new();
//! server.get("/ping", |_, res, _| res.plain("pong", None))?;
//! server.get("/users/:id", |_, res, caps| {
//!     res.json(serde_json::json!({ "id": caps.get(0) }), None)
//! })?;
//!
//! let handle = server.listen(8080).await?;
//! handle.wait().await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use http::{Body, HandlerResult, Payload, Reply, Request, Response, Server, ServerHandle};
pub use lifecycle::Shutdown;
pub use routing::{Captures, Method};
