//! Outcome classification.
//!
//! Receipts are interpreted directly. Node error text is opaque, so it is
//! matched against an explicit rule table; text no rule recognizes is
//! reported as `Unclassified` rather than guessed at.

use std::fmt;

use alloy::primitives::TxHash;
use serde::Serialize;

use crate::anchor::error::AnchorError;
use crate::anchor::uniqueness::InvoiceCandidate;
use crate::chain::{ChainError, InvoiceRegistry, ReceiptStatus, SubmissionReceipt};

/// What a node's error text is taken to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureSignal {
    /// Balance complaint. Some endpoints emit this for unrelated failures.
    AmbiguousFunds,
    /// Contract execution rejected the call.
    Revert,
    /// No rule matched.
    Unclassified,
}

impl fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureSignal::AmbiguousFunds => "ambiguous funds",
            FailureSignal::Revert => "revert",
            FailureSignal::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}

/// A rule matches when every fragment occurs in the lowercased text.
struct SignalRule {
    all_of: &'static [&'static str],
    signal: FailureSignal,
}

/// Checked in order; the first match wins.
const SIGNAL_RULES: &[SignalRule] = &[
    // Substrate-backed EVM endpoints answer "1010: Invalid Transaction ...
    // balance too low" for several unrelated rejections.
    SignalRule {
        all_of: &["1010", "balance too low"],
        signal: FailureSignal::AmbiguousFunds,
    },
    SignalRule {
        all_of: &["insufficient funds"],
        signal: FailureSignal::AmbiguousFunds,
    },
    SignalRule {
        all_of: &["execution reverted"],
        signal: FailureSignal::Revert,
    },
    SignalRule {
        all_of: &["revert"],
        signal: FailureSignal::Revert,
    },
    SignalRule {
        all_of: &["invalid opcode"],
        signal: FailureSignal::Revert,
    },
];

/// Map node error text onto a [`FailureSignal`].
pub fn classify_error_text(text: &str) -> FailureSignal {
    let lowered = text.to_lowercase();
    SIGNAL_RULES
        .iter()
        .find(|rule| rule.all_of.iter().all(|fragment| lowered.contains(fragment)))
        .map(|rule| rule.signal)
        .unwrap_or(FailureSignal::Unclassified)
}

/// Turn a failed broadcast into its run-level category.
///
/// Only a JSON-RPC error response is a verdict on the transaction. A
/// transport failure or timeout means the node may or may not have the
/// bytes, so the outcome is unknown; `tx_hash` is reported so the operator
/// can look it up before re-running.
pub fn classify_broadcast_error(err: ChainError, tx_hash: TxHash) -> AnchorError {
    let message = match err {
        ChainError::Call(message) => message,
        other if other.is_connectivity() => {
            tracing::warn!(
                tx_hash = %tx_hash,
                error = %other,
                "Broadcast did not complete; transaction state unknown"
            );
            return AnchorError::BroadcastUnknown {
                tx_hash,
                reason: other.to_string(),
            };
        }
        other => return AnchorError::from(other),
    };

    match classify_error_text(&message) {
        FailureSignal::AmbiguousFunds => {
            tracing::error!(
                tx_hash = %tx_hash,
                error = %message,
                "Node reported insufficient funds (potentially misleading)"
            );
            AnchorError::AmbiguousFunds { message }
        }
        signal => {
            tracing::error!(
                tx_hash = %tx_hash,
                signal = %signal,
                error = %message,
                "Node rejected transaction"
            );
            AnchorError::Broadcast { signal, message }
        }
    }
}

/// A submission whose effect has been observed on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub candidate: InvoiceCandidate,
    pub receipt: SubmissionReceipt,
}

/// Interpret a receipt, re-reading the registry on success.
///
/// A node can report success optimistically; only a visible content hash
/// counts as confirmed.
pub async fn classify_receipt(
    registry: &InvoiceRegistry<'_>,
    candidate: InvoiceCandidate,
    receipt: SubmissionReceipt,
) -> Result<Confirmed, AnchorError> {
    match receipt.status {
        ReceiptStatus::Failed => {
            tracing::error!(
                tx_hash = %receipt.transaction_id,
                block_number = receipt.block_number,
                "Transaction failed on-chain (status 0)"
            );
            Err(AnchorError::OnChainRevert {
                tx_hash: receipt.transaction_id,
                block_number: receipt.block_number,
            })
        }
        ReceiptStatus::Success => {
            let exists = registry.sha_exists(candidate.content_hash).await?;
            tracing::info!(
                tx_hash = %receipt.transaction_id,
                content_hash = %candidate.content_hash,
                exists = exists,
                "Post-confirmation hash check"
            );
            if exists {
                Ok(Confirmed { candidate, receipt })
            } else {
                Err(AnchorError::VerificationMismatch {
                    tx_hash: receipt.transaction_id,
                    content_hash: candidate.content_hash,
                })
            }
        }
    }
}
