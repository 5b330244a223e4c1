//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AnchorConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_RPC_URL: &str = "ANCHOR_RPC_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "ANCHOR_CONTRACT_ADDRESS";
pub const ENV_EXPECTED_ADDRESS: &str = "ANCHOR_EXPECTED_ADDRESS";
pub const ENV_CHAIN_ID: &str = "ANCHOR_CHAIN_ID";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<AnchorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: AnchorConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults and environment overrides only.
pub fn load_from_env() -> Result<AnchorConfig, ConfigError> {
    let mut config = AnchorConfig::default();

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-sourced values onto `config`.
///
/// `lookup` is injected so tests don't have to mutate the process environment.
pub fn apply_env_overrides<F>(config: &mut AnchorConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_RPC_URL) {
        config.ledger.rpc_url = url;
    }
    if let Some(address) = lookup(ENV_CONTRACT_ADDRESS) {
        config.contract.address = address;
    }
    if let Some(address) = lookup(ENV_EXPECTED_ADDRESS) {
        config.signer.expected_address = address;
    }
    if let Some(raw) = lookup(ENV_CHAIN_ID) {
        let chain_id = raw.trim().parse::<u64>().map_err(|e| ConfigError::Env {
            var: ENV_CHAIN_ID,
            reason: e.to_string(),
        })?;
        config.ledger.chain_id = Some(chain_id);
    }
    Ok(())
}
