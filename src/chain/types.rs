//! Ledger-facing types and error definitions.

use alloy::primitives::{Address, TxHash, B256};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the ledger client.
///
/// Callers branch on [`ChainError::is_connectivity`]: a dead endpoint and a
/// node that rejected a call need different operator responses.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The endpoint could not be reached or did not answer in time.
    #[error("RPC endpoint unreachable: {0}")]
    Connectivity(String),

    /// The node answered with a JSON-RPC error (rejected or reverted).
    #[error("RPC call rejected: {0}")]
    Call(String),

    /// The node answered but the payload did not decode as expected.
    #[error("failed to decode {method} result: {reason}")]
    Decode { method: &'static str, reason: String },

    /// No receipt was observed before the deadline.
    #[error("no receipt for {tx_hash} after {waited_secs} seconds")]
    ReceiptTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// The configured endpoint URL is malformed.
    #[error("invalid RPC URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The endpoint serves a different chain than configured.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl ChainError {
    /// Whether this error means the endpoint itself is unusable.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ChainError::Connectivity(_)
                | ChainError::InvalidEndpoint { .. }
                | ChainError::ChainMismatch { .. }
        )
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::Connectivity(_) => "connectivity",
            ChainError::Call(_) => "call",
            ChainError::Decode { .. } => "decode",
            ChainError::ReceiptTimeout { .. } => "receipt_timeout",
            ChainError::InvalidEndpoint { .. } => "invalid_endpoint",
            ChainError::ChainMismatch { .. } => "chain_mismatch",
        }
    }
}

/// Result type for ledger operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Terminal status recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReceiptStatus {
    Success,
    Failed,
}

/// The ledger's record of a transaction's inclusion.
///
/// A `Failed` status is a valid terminal state, not a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub transaction_id: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    /// Wei per gas actually paid.
    pub effective_gas_price: u128,
    pub status: ReceiptStatus,
}

impl SubmissionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Decoded `getInvoice` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRecord {
    pub content_hash: B256,
    pub hashcode: String,
    pub issuer: Address,
    /// Anchoring time in seconds; zero when the code was never anchored.
    pub timestamp: u64,
    pub revoked: bool,
    pub completed: bool,
}

impl InvoiceRecord {
    /// Whether the registry has ever stored this code.
    pub fn is_anchored(&self) -> bool {
        self.timestamp != 0
    }

    /// Human-readable lifecycle state.
    pub fn state(&self) -> InvoiceState {
        if !self.is_anchored() {
            InvoiceState::NotFound
        } else if self.completed {
            InvoiceState::Completed
        } else if self.revoked {
            InvoiceState::Revoked
        } else {
            InvoiceState::Active
        }
    }
}

/// Lifecycle state of an anchored invoice as seen by verifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    NotFound,
    Active,
    Revoked,
    Completed,
}

impl std::fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InvoiceState::NotFound => "not found",
            InvoiceState::Active => "active",
            InvoiceState::Revoked => "revoked",
            InvoiceState::Completed => "completed",
        };
        f.write_str(label)
    }
}
