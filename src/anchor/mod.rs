//! Anchoring pipeline.
//!
//! # Data Flow
//! ```text
//! SecretKey (env) ──▶ identity.rs (derive + compare address)
//!                        │
//!                        ▼
//!                authorization.rs (whitelist, paused)
//!                        │
//!                        ▼
//!                uniqueness.rs (INV-XXXX-XXXX + 32-byte hash, bounded search)
//!                        │
//!                        ▼
//!                submitter.rs (EIP-1559 build, sign, broadcast, receipt wait)
//!                        │
//!                        ▼
//!                outcome.rs (receipt + error text → AnchorError taxonomy)
//! ```
//! `runner.rs` drives the stages in order; `inspect.rs` holds the read-only
//! operator views.
//!
//! # Security Constraints
//! - Private key material only lives inside `identity.rs`
//! - Signing is local; the endpoint only ever sees signed bytes

pub mod authorization;
pub mod error;
pub mod fees;
pub mod identity;
pub mod inspect;
pub mod outcome;
pub mod runner;
pub mod submitter;
pub mod uniqueness;

pub use error::AnchorError;
pub use fees::FeeParameters;
pub use identity::{resolve, SecretKey, SigningIdentity};
pub use outcome::{classify_error_text, FailureSignal};
pub use runner::{execute, parse_address, prepare, report_failure, RunReport, RunSettings};
pub use submitter::{submit, ReceiptPolicy};
pub use uniqueness::{generate, HumanId, InvoiceCandidate, UniquenessPolicy};
