//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! LedgerConfig (RPC URL, failovers, timeouts)
//!     → client.rs (Ledger trait, RpcLedger with failover)
//!     → contract.rs (typed registry calls over Ledger::call)
//!     → cache.rs (owned TTL cache for verification lookups)
//! ```
//!
//! # Security Constraints
//! - Nothing in this module ever sees a private key
//! - All RPC calls have configurable timeouts

pub mod abi;
pub mod cache;
pub mod client;
pub mod contract;
pub mod types;

pub use cache::InvoiceCache;
pub use client::{Ledger, RpcLedger};
pub use contract::InvoiceRegistry;
pub use types::{
    ChainError, ChainResult, InvoiceRecord, InvoiceState, ReceiptStatus, SubmissionReceipt,
};
