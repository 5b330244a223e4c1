//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Enforce the fee invariant before anything touches the network
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AnchorConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::AnchorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AnchorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.ledger.rpc_url) {
        errors.push(ValidationError::new("ledger.rpc_url", e.to_string()));
    }
    for failover in &config.ledger.failover_urls {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(
                "ledger.failover_urls",
                format!("'{}': {}", failover, e),
            ));
        }
    }
    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }

    check_address(&mut errors, "contract.address", &config.contract.address);
    // Only `submit` and `status` need the signer address; they check presence.
    if !config.signer.expected_address.is_empty() {
        check_address(
            &mut errors,
            "signer.expected_address",
            &config.signer.expected_address,
        );
    }
    if config.signer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("signer.private_key_env", "must not be empty"));
    }

    let fees = &config.fees;
    if fees.gas_limit == 0 {
        errors.push(ValidationError::new("fees.gas_limit", "must be > 0"));
    }
    if fees.max_priority_fee_per_gas_gwei > fees.max_fee_per_gas_gwei {
        errors.push(ValidationError::new(
            "fees.max_priority_fee_per_gas_gwei",
            format!(
                "{} exceeds max_fee_per_gas_gwei {}",
                fees.max_priority_fee_per_gas_gwei, fees.max_fee_per_gas_gwei
            ),
        ));
    }

    let uniqueness = &config.uniqueness;
    if uniqueness.max_attempts == 0 {
        errors.push(ValidationError::new("uniqueness.max_attempts", "must be >= 1"));
    }
    if uniqueness.backoff_base_ms > uniqueness.backoff_max_ms {
        errors.push(ValidationError::new(
            "uniqueness.backoff_base_ms",
            "must not exceed backoff_max_ms",
        ));
    }
    if let Err(message) = check_alphabet(&uniqueness.alphabet) {
        errors.push(ValidationError::new("uniqueness.alphabet", message));
    }

    if config.receipt.timeout_secs == 0 {
        errors.push(ValidationError::new("receipt.timeout_secs", "must be > 0"));
    }
    if config.receipt.poll_interval_ms == 0 {
        errors.push(ValidationError::new("receipt.poll_interval_ms", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::new(field, "is required"));
    } else if let Err(e) = value.parse::<Address>() {
        errors.push(ValidationError::new(field, format!("'{}': {}", value, e)));
    }
}

/// Alphabet must be non-empty uppercase ASCII alphanumerics without repeats.
pub fn check_alphabet(alphabet: &str) -> Result<(), String> {
    if alphabet.is_empty() {
        return Err("must not be empty".to_string());
    }
    let mut seen = HashSet::new();
    for c in alphabet.chars() {
        if !(c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(format!("invalid character '{}'", c));
        }
        if !seen.insert(c) {
            return Err(format!("duplicate character '{}'", c));
        }
    }
    Ok(())
}
