//! Invoice anchoring library.
//!
//! Submits an invoice commitment (`INV-XXXX-XXXX` plus a 32-byte content
//! hash) to an on-chain registry, and verifies anchored invoices.

pub mod anchor;
pub mod chain;
pub mod config;
pub mod observability;
pub mod resilience;

pub use anchor::{AnchorError, RunReport, RunSettings};
pub use chain::{Ledger, RpcLedger};
pub use config::AnchorConfig;
