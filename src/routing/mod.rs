//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before listening):
//!     (method, "/users/:id", handler)
//!     → pattern.rs (compile to anchored matcher, record names)
//!     → table.rs (append to method's ordered list, or replace in place)
//!
//! Incoming request (method, path):
//!     → table.rs (scan method's routes in registration order)
//!     → pattern.rs (anchored match, extract captures)
//!     → Return: RouteMatch { route, captures } or None
//! ```
//!
//! # Design Decisions
//! - Routes frozen once the server starts listening
//! - Deterministic: first registered match wins
//! - Single-segment placeholders only; no wildcards or optional segments

pub mod method;
pub mod pattern;
pub mod table;

pub use method::Method;
pub use pattern::{Captures, CompiledPattern};
pub use table::{Route, RouteMatch, RouteTable};
