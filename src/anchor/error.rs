//! Failure taxonomy of an anchoring run.

use alloy::primitives::{Address, TxHash, B256};
use thiserror::Error;

use crate::anchor::outcome::FailureSignal;
use crate::chain::ChainError;

/// Every way a run can end other than a verified confirmation.
///
/// Each variant maps to its own exit code so an operator (or a wrapping
/// script) can pick the right remedy without parsing text.
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("ledger unreachable: {0}")]
    Connectivity(String),

    #[error("ledger rejected read: {0}")]
    Call(String),

    #[error("private key derives {derived}, expected {expected}")]
    IdentityMismatch { derived: Address, expected: Address },

    #[error("signer {0} is not on the registry allow-list")]
    AuthorizationDenied(Address),

    #[error("registry {0} is paused")]
    ContractPaused(Address),

    #[error("no unused invoice identifier and content hash after {attempts} attempts")]
    ExhaustedAttempts { attempts: u32 },

    #[error("cannot build transaction: {0}")]
    Build(String),

    #[error("cannot sign transaction: {0}")]
    Sign(String),

    #[error("node rejected transaction ({signal}): {message}")]
    Broadcast {
        signal: FailureSignal,
        message: String,
    },

    #[error(
        "node reported insufficient funds, a signal this endpoint is known to misreport; \
         check the balance independently before topping up: {message}"
    )]
    AmbiguousFunds { message: String },

    #[error(
        "outcome unknown: broadcast of {tx_hash} did not complete ({reason}); \
         the transaction may still confirm, reconcile before re-running"
    )]
    BroadcastUnknown { tx_hash: TxHash, reason: String },

    #[error(
        "outcome unknown: no receipt for {tx_hash} within {waited_secs}s; \
         the transaction may still confirm, reconcile before re-running"
    )]
    ReceiptTimeout { tx_hash: TxHash, waited_secs: u64 },

    #[error("transaction {tx_hash} was included in block {block_number} but reverted")]
    OnChainRevert { tx_hash: TxHash, block_number: u64 },

    #[error(
        "transaction {tx_hash} reported success but content hash {content_hash} \
         is not visible on-chain"
    )]
    VerificationMismatch { tx_hash: TxHash, content_hash: B256 },
}

impl AnchorError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnchorError::Config(_) => 2,
            AnchorError::Connectivity(_) => 10,
            AnchorError::Call(_) => 11,
            AnchorError::IdentityMismatch { .. } => 20,
            AnchorError::AuthorizationDenied(_) => 21,
            AnchorError::ContractPaused(_) => 22,
            AnchorError::ExhaustedAttempts { .. } => 30,
            AnchorError::Build(_) => 40,
            AnchorError::Sign(_) => 41,
            AnchorError::Broadcast { .. } => 42,
            AnchorError::AmbiguousFunds { .. } => 43,
            AnchorError::ReceiptTimeout { .. } => 50,
            AnchorError::BroadcastUnknown { .. } => 51,
            AnchorError::OnChainRevert { .. } => 60,
            AnchorError::VerificationMismatch { .. } => 70,
        }
    }

    /// Stable label for logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            AnchorError::Config(_) => "config",
            AnchorError::Connectivity(_) => "connectivity",
            AnchorError::Call(_) => "call",
            AnchorError::IdentityMismatch { .. } => "identity_mismatch",
            AnchorError::AuthorizationDenied(_) => "authorization_denied",
            AnchorError::ContractPaused(_) => "contract_paused",
            AnchorError::ExhaustedAttempts { .. } => "exhausted_attempts",
            AnchorError::Build(_) => "build",
            AnchorError::Sign(_) => "sign",
            AnchorError::Broadcast { .. } => "broadcast",
            AnchorError::AmbiguousFunds { .. } => "ambiguous_funds",
            AnchorError::ReceiptTimeout { .. } => "receipt_timeout",
            AnchorError::BroadcastUnknown { .. } => "broadcast_unknown",
            AnchorError::OnChainRevert { .. } => "on_chain_revert",
            AnchorError::VerificationMismatch { .. } => "verification_mismatch",
        }
    }

    /// True when the transaction may or may not have landed.
    pub fn is_unknown_outcome(&self) -> bool {
        matches!(
            self,
            AnchorError::ReceiptTimeout { .. } | AnchorError::BroadcastUnknown { .. }
        )
    }
}

impl From<ChainError> for AnchorError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::ReceiptTimeout {
                tx_hash,
                waited_secs,
            } => AnchorError::ReceiptTimeout {
                tx_hash,
                waited_secs,
            },
            ChainError::Call(_) | ChainError::Decode { .. } => AnchorError::Call(err.to_string()),
            ChainError::Connectivity(_)
            | ChainError::InvalidEndpoint { .. }
            | ChainError::ChainMismatch { .. } => AnchorError::Connectivity(err.to_string()),
        }
    }
}
