//! Resilience subsystem.
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every RPC request has a deadline and the
//!   receipt wait has a hard one
//! - Retries are bounded; the only retry loop in a run is the uniqueness
//!   search, paced by `backoff.rs`
//! - Nothing is retried after a broadcast

pub mod backoff;

pub use backoff::Backoff;
