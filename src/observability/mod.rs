//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters per outcome, conflict, RPC error)
//! ```
//!
//! # Design Decisions
//! - Every failure category is logged with a distinct `category` field
//! - Key material never reaches a log line

pub mod logging;
pub mod metrics;
