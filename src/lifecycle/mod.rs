//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Register routes → Freeze table → Bind listener → Spawn serve loop
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain in-flight requests → Serve task exits
//!
//! Signals (signals.rs):
//!     SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Listener starts last (traffic only when routes are final)
//! - Shutdown is cooperative: in-flight handlers finish

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
