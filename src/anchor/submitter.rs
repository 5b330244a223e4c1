//! Transaction construction, signing and broadcast.
//!
//! # Flow
//! ```text
//! FeeParameters::validate   (no network)
//!     → chain id + nonce    (ledger reads)
//!     → build TxEip1559     (calldata = submitInvoice)
//!     → sign locally        (SigningIdentity)
//!     → send_raw            (exactly once, never retried)
//!     → wait_for_receipt    (hard deadline)
//! ```

use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};

use crate::anchor::error::AnchorError;
use crate::anchor::fees::{format_gwei, FeeParameters};
use crate::anchor::identity::SigningIdentity;
use crate::anchor::outcome::classify_broadcast_error;
use crate::anchor::uniqueness::InvoiceCandidate;
use crate::chain::contract::submit_invoice_calldata;
use crate::chain::{Ledger, SubmissionReceipt};
use crate::config::ReceiptConfig;

/// How long to wait for inclusion, and how often to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ReceiptPolicy {
    pub fn from_config(config: &ReceiptConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Signed, encoded transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSubmission {
    /// EIP-2718 envelope bytes.
    pub raw: Bytes,
    /// Hash the node should report back.
    pub tx_hash: TxHash,
    pub nonce: u64,
}

/// Build the unsigned `submitInvoice` transaction.
pub fn build_transaction(
    chain_id: u64,
    nonce: u64,
    contract: Address,
    candidate: &InvoiceCandidate,
    fees: &FeeParameters,
) -> Result<TxEip1559, AnchorError> {
    fees.validate()?;

    Ok(TxEip1559 {
        chain_id,
        nonce,
        gas_limit: fees.gas_limit,
        max_fee_per_gas: fees.max_fee_per_gas,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        to: TxKind::Call(contract),
        value: U256::ZERO,
        access_list: Default::default(),
        input: submit_invoice_calldata(candidate.content_hash, candidate.human_id.as_str()),
    })
}

/// Sign `tx` locally and encode it for broadcast.
pub fn sign_transaction(
    identity: &SigningIdentity,
    tx: TxEip1559,
) -> Result<SignedSubmission, AnchorError> {
    let nonce = tx.nonce;
    let signature = identity.sign_hash(&tx.signature_hash())?;
    let envelope = TxEnvelope::from(tx.into_signed(signature));

    Ok(SignedSubmission {
        raw: Bytes::from(envelope.encoded_2718()),
        tx_hash: *envelope.tx_hash(),
        nonce,
    })
}

/// Build, sign and broadcast one anchoring transaction, then wait for its
/// receipt.
///
/// Fee parameters are checked before any ledger access. The broadcast happens
/// at most once; nothing after it is retried.
pub async fn submit(
    ledger: &dyn Ledger,
    identity: &SigningIdentity,
    contract: Address,
    candidate: &InvoiceCandidate,
    fees: &FeeParameters,
    policy: &ReceiptPolicy,
) -> Result<SubmissionReceipt, AnchorError> {
    fees.validate()?;

    let chain_id = ledger.chain_id().await?;
    let nonce = ledger.nonce_of(identity.address()).await?;

    let tx = build_transaction(chain_id, nonce, contract, candidate, fees)?;
    let signed = sign_transaction(identity, tx)?;

    tracing::info!(
        chain_id = chain_id,
        nonce = nonce,
        gas_limit = fees.gas_limit,
        max_fee_gwei = %format_gwei(fees.max_fee_per_gas),
        priority_fee_gwei = %format_gwei(fees.max_priority_fee_per_gas),
        tx_hash = %signed.tx_hash,
        "Sending transaction"
    );

    let reported = ledger
        .send_raw(signed.raw.clone())
        .await
        .map_err(|e| classify_broadcast_error(e, signed.tx_hash))?;

    if reported != signed.tx_hash {
        tracing::warn!(
            local = %signed.tx_hash,
            reported = %reported,
            "Node reported a different transaction hash"
        );
    }

    tracing::info!(
        tx_hash = %reported,
        timeout_secs = policy.timeout.as_secs(),
        "Transaction sent, waiting for receipt"
    );

    let receipt = ledger
        .wait_for_receipt(reported, policy.timeout, policy.poll_interval)
        .await?;

    tracing::info!(
        tx_hash = %receipt.transaction_id,
        block_number = receipt.block_number,
        gas_used = receipt.gas_used,
        succeeded = receipt.succeeded(),
        "Receipt received"
    );

    Ok(receipt)
}
