//! One anchoring run, end to end.
//!
//! # Stage order
//! ```text
//! prepare: resolve identity + fee check   (local only, no ledger access)
//! execute:
//!     preflight        (contract code, balance)
//!     → allow-list + pause
//!     → uniqueness search
//!     → submit + receipt wait
//!     → outcome classification
//! ```
//! Every stage is fail-fast. Only a confirmed, re-verified anchor returns `Ok`.
//! Callers connect to the ledger only after `prepare` succeeds.

use std::path::Path;

use alloy::primitives::{Address, U256};
use rand::Rng;
use tracing::Instrument;

use crate::anchor::authorization::{check_authorization, check_not_paused};
use crate::anchor::error::AnchorError;
use crate::anchor::fees::FeeParameters;
use crate::anchor::identity::{resolve, SecretKey, SigningIdentity};
use crate::anchor::outcome::{classify_receipt, Confirmed};
use crate::anchor::submitter::{submit, ReceiptPolicy};
use crate::anchor::uniqueness::{generate, InvoiceCandidate, UniquenessPolicy};
use crate::chain::abi::{check_abi, load_abi};
use crate::chain::{InvoiceRegistry, Ledger, SubmissionReceipt};
use crate::config::AnchorConfig;
use crate::observability::metrics;

/// Everything a run needs, parsed out of the configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub contract: Address,
    pub expected_address: Address,
    pub fees: FeeParameters,
    pub uniqueness: UniquenessPolicy,
    pub receipt: ReceiptPolicy,
}

impl RunSettings {
    /// Parse addresses, convert fees and check the ABI file when one is
    /// configured. Unlike `verify`, a run needs `signer.expected_address`.
    pub fn from_config(config: &AnchorConfig) -> Result<Self, AnchorError> {
        let contract = parse_address("contract.address", &config.contract.address)?;
        if config.signer.expected_address.is_empty() {
            return Err(AnchorError::Config(
                "signer.expected_address is required for this command".into(),
            ));
        }
        let expected_address =
            parse_address("signer.expected_address", &config.signer.expected_address)?;

        if let Some(path) = &config.contract.abi_path {
            let abi = load_abi(Path::new(path))
                .map_err(|e| AnchorError::Config(format!("ABI file {}: {}", path, e)))?;
            check_abi(&abi)
                .map_err(|e| AnchorError::Config(format!("ABI file {}: {}", path, e)))?;
            tracing::debug!(path = %path, "ABI file matches compiled interface");
        }

        Ok(Self {
            contract,
            expected_address,
            fees: FeeParameters::from_config(&config.fees),
            uniqueness: UniquenessPolicy::from_config(&config.uniqueness),
            receipt: ReceiptPolicy::from_config(&config.receipt),
        })
    }
}

/// Parse a configured address, naming the field on failure.
pub fn parse_address(field: &str, value: &str) -> Result<Address, AnchorError> {
    value
        .parse()
        .map_err(|e| AnchorError::Config(format!("{} '{}': {}", field, value, e)))
}

/// What a successful run anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub address: Address,
    pub candidate: InvoiceCandidate,
    pub receipt: SubmissionReceipt,
}

/// Local checks that need no ledger: derive the identity, compare it to the
/// configured address, validate the fee parameters.
pub fn prepare(settings: &RunSettings, key: &SecretKey) -> Result<SigningIdentity, AnchorError> {
    let identity = resolve(key, settings.expected_address)?;
    settings.fees.validate()?;
    Ok(identity)
}

/// Run the ledger-facing stages once for a prepared identity.
///
/// `rng` feeds both the identifier and the content hash; callers pass an
/// OS-seeded CSPRNG.
pub async fn execute<R: Rng>(
    ledger: &dyn Ledger,
    settings: &RunSettings,
    identity: &SigningIdentity,
    rng: &mut R,
) -> Result<RunReport, AnchorError> {
    let span = tracing::info_span!(
        "anchor_run",
        address = %identity.address(),
        contract = %settings.contract
    );

    let result = run_stages(ledger, settings, identity, rng)
        .instrument(span)
        .await;

    if let Ok(report) = &result {
        metrics::record_run("confirmed");
        tracing::info!(
            human_id = %report.candidate.human_id,
            content_hash = %report.candidate.content_hash,
            tx_hash = %report.receipt.transaction_id,
            block_number = report.receipt.block_number,
            "Invoice anchored and verified"
        );
    }

    result
}

/// Log and count a failed command under its category.
///
/// Every error leaving `main` goes through here, configuration errors
/// included.
pub fn report_failure(e: &AnchorError) {
    metrics::record_run(e.category());
    if e.is_unknown_outcome() {
        tracing::warn!(category = e.category(), error = %e, "Run ended with unknown outcome");
    } else {
        tracing::error!(category = e.category(), error = %e, "Run failed");
    }
}

async fn run_stages<R: Rng>(
    ledger: &dyn Ledger,
    settings: &RunSettings,
    identity: &SigningIdentity,
    rng: &mut R,
) -> Result<RunReport, AnchorError> {
    settings.fees.validate()?;
    preflight(ledger, settings, identity.address()).await?;

    let registry = InvoiceRegistry::new(ledger, settings.contract);
    check_authorization(&registry, identity.address()).await?;
    check_not_paused(&registry).await?;

    let candidate = generate(&registry, &settings.uniqueness, rng).await?;

    let receipt = submit(
        ledger,
        identity,
        settings.contract,
        &candidate,
        &settings.fees,
        &settings.receipt,
    )
    .await?;

    let Confirmed { candidate, receipt } = classify_receipt(&registry, candidate, receipt).await?;

    Ok(RunReport {
        address: identity.address(),
        candidate,
        receipt,
    })
}

/// Contract presence and a balance sanity check.
///
/// A low balance only warns; the node decides whether the fee is payable.
async fn preflight(
    ledger: &dyn Ledger,
    settings: &RunSettings,
    address: Address,
) -> Result<(), AnchorError> {
    let code = ledger.code_at(settings.contract).await?;
    if code.is_empty() {
        return Err(AnchorError::Config(format!(
            "no contract deployed at {}",
            settings.contract
        )));
    }

    let balance = ledger.balance_of(address).await?;
    let max_cost = settings.fees.max_cost();
    tracing::info!(address = %address, balance = %balance, max_cost = %max_cost, "Account balance");

    if balance == U256::ZERO || balance < max_cost {
        tracing::warn!(
            balance = %balance,
            max_cost = %max_cost,
            "Balance may not cover the configured fee caps"
        );
    }
    Ok(())
}
