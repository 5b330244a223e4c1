//! Read-only views for operators: invoice verification and a preflight
//! status snapshot. Neither signs nor broadcasts anything.

use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

use crate::anchor::error::AnchorError;
use crate::anchor::identity::{resolve, SecretKey};
use crate::anchor::runner::RunSettings;
use crate::anchor::uniqueness::HumanId;
use crate::chain::{InvoiceCache, InvoiceRegistry, InvoiceState, Ledger};

/// Registry state of one invoice code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub human_id: String,
    pub state: InvoiceState,
    pub content_hash: Option<B256>,
    pub issuer: Option<Address>,
    pub timestamp: Option<u64>,
}

/// Look up a loosely typed invoice code, serving repeats from `cache`.
pub async fn verify(
    registry: &InvoiceRegistry<'_>,
    cache: &InvoiceCache,
    input: &str,
) -> Result<Verification, AnchorError> {
    let human_id = HumanId::normalize(input).map_err(|e| AnchorError::Config(e.to_string()))?;
    let record = cache.get_or_fetch(registry, human_id.as_str()).await?;
    let state = record.state();

    tracing::debug!(human_id = %human_id, state = %state, "Invoice looked up");

    let anchored = record.is_anchored();
    Ok(Verification {
        human_id: human_id.to_string(),
        state,
        content_hash: anchored.then_some(record.content_hash),
        issuer: anchored.then_some(record.issuer),
        timestamp: anchored.then_some(record.timestamp),
    })
}

/// Account side of the status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerStatus {
    pub address: Address,
    /// Whether the private key was available and derives to `address`.
    pub key_verified: bool,
    pub balance_wei: U256,
    pub balance: String,
    pub nonce: u64,
    pub whitelisted: Option<bool>,
}

/// Preflight snapshot of endpoint, registry and signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub chain_id: u64,
    pub contract: Address,
    pub contract_deployed: bool,
    pub owner: Option<Address>,
    pub paused: Option<bool>,
    pub signer: SignerStatus,
}

/// Gather the status snapshot.
///
/// Without a key the configured address is reported unverified. With a key
/// that derives elsewhere the snapshot fails with an identity mismatch.
pub async fn status(
    ledger: &dyn Ledger,
    settings: &RunSettings,
    key: Option<&SecretKey>,
    native_decimals: u8,
) -> Result<StatusReport, AnchorError> {
    let (address, key_verified) = match key {
        Some(key) => (resolve(key, settings.expected_address)?.address(), true),
        None => (settings.expected_address, false),
    };

    let chain_id = ledger.chain_id().await?;
    let balance_wei = ledger.balance_of(address).await?;
    let nonce = ledger.nonce_of(address).await?;
    let contract_deployed = !ledger.code_at(settings.contract).await?.is_empty();

    let balance = format_units(balance_wei, native_decimals)
        .unwrap_or_else(|_| format!("{} (raw)", balance_wei));

    let registry = InvoiceRegistry::new(ledger, settings.contract);
    let (owner, paused, whitelisted) = if contract_deployed {
        (
            Some(registry.owner().await?),
            Some(registry.paused().await?),
            Some(registry.whitelist(address).await?),
        )
    } else {
        tracing::warn!(contract = %settings.contract, "No contract code at configured address");
        (None, None, None)
    };

    Ok(StatusReport {
        chain_id,
        contract: settings.contract,
        contract_deployed,
        owner,
        paused,
        signer: SignerStatus {
            address,
            key_verified,
            balance_wei,
            balance,
            nonce,
            whitelisted,
        },
    })
}
