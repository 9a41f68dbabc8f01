//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → whichever `metrics` recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs via the trace layer span
//! - Metrics are cheap and optional (config switch)

pub mod logging;
pub mod metrics;
