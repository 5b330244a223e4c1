//! Contract ABI description loading.
//!
//! The registry interface is compiled in; an operator-supplied ABI file is
//! only used to confirm the deployed contract exposes the same methods.

use std::fs;
use std::path::Path;

use alloy::json_abi::JsonAbi;
use alloy::sol_types::SolCall;
use thiserror::Error;

use crate::chain::contract::{getInvoiceCall, shaExistsCall, submitInvoiceCall, whitelistCall};

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("cannot read ABI file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse ABI file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("ABI file is neither an array nor an artifact with an 'abi' key")]
    UnexpectedFormat,

    #[error("ABI does not expose required function {0}")]
    MissingFunction(&'static str),
}

/// Functions the submitter relies on, with their compiled selectors.
fn required_functions() -> [(&'static str, &'static str, [u8; 4]); 4] {
    [
        ("whitelist", whitelistCall::SIGNATURE, whitelistCall::SELECTOR),
        ("getInvoice", getInvoiceCall::SIGNATURE, getInvoiceCall::SELECTOR),
        ("shaExists", shaExistsCall::SIGNATURE, shaExistsCall::SELECTOR),
        ("submitInvoice", submitInvoiceCall::SIGNATURE, submitInvoiceCall::SELECTOR),
    ]
}

/// Parse an ABI description: either a bare JSON array or a build artifact
/// object carrying the array under `abi`.
pub fn parse_abi(content: &str) -> Result<JsonAbi, AbiError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let items = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut artifact) => {
            artifact.remove("abi").ok_or(AbiError::UnexpectedFormat)?
        }
        _ => return Err(AbiError::UnexpectedFormat),
    };
    Ok(serde_json::from_value(items)?)
}

pub fn load_abi(path: &Path) -> Result<JsonAbi, AbiError> {
    let content = fs::read_to_string(path)?;
    parse_abi(&content)
}

/// Check that every required function is present with a matching selector.
pub fn check_abi(abi: &JsonAbi) -> Result<(), AbiError> {
    for (name, signature, selector) in required_functions() {
        let present = abi
            .function(name)
            .map(|overloads| overloads.iter().any(|f| f.selector().0 == selector))
            .unwrap_or(false);
        if !present {
            return Err(AbiError::MissingFunction(signature));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY_ABI: &str = r#"[
        {"type":"function","name":"whitelist","stateMutability":"view",
         "inputs":[{"name":"","type":"address","internalType":"address"}],
         "outputs":[{"name":"","type":"bool","internalType":"bool"}]},
        {"type":"function","name":"getInvoice","stateMutability":"view",
         "inputs":[{"name":"hashcode","type":"string","internalType":"string"}],
         "outputs":[{"name":"","type":"tuple","internalType":"struct Invoice","components":[
            {"name":"sha256Hash","type":"bytes32","internalType":"bytes32"},
            {"name":"hashcode","type":"string","internalType":"string"},
            {"name":"issuer","type":"address","internalType":"address"},
            {"name":"timestamp","type":"uint256","internalType":"uint256"},
            {"name":"revoked","type":"bool","internalType":"bool"},
            {"name":"completed","type":"bool","internalType":"bool"}]}]},
        {"type":"function","name":"shaExists","stateMutability":"view",
         "inputs":[{"name":"","type":"bytes32","internalType":"bytes32"}],
         "outputs":[{"name":"","type":"bool","internalType":"bool"}]},
        {"type":"function","name":"submitInvoice","stateMutability":"nonpayable",
         "inputs":[{"name":"sha256Hash","type":"bytes32","internalType":"bytes32"},
                   {"name":"hashcode","type":"string","internalType":"string"}],
         "outputs":[]}
    ]"#;

    #[test]
    fn test_bare_array() {
        let abi = parse_abi(REGISTRY_ABI).unwrap();
        assert!(check_abi(&abi).is_ok());
    }

    #[test]
    fn test_artifact_object() {
        let artifact = format!(r#"{{"contractName":"EurekaInvoiceRegistry","abi":{}}}"#, REGISTRY_ABI);
        let abi = parse_abi(&artifact).unwrap();
        assert!(check_abi(&abi).is_ok());
    }

    #[test]
    fn test_wrong_signature_rejected() {
        // whitelist(uint256) has a different selector than whitelist(address).
        let abi = parse_abi(&REGISTRY_ABI.replace(
            r#""inputs":[{"name":"","type":"address","internalType":"address"}]"#,
            r#""inputs":[{"name":"","type":"uint256","internalType":"uint256"}]"#,
        ))
        .unwrap();
        let err = check_abi(&abi).unwrap_err();
        assert!(matches!(err, AbiError::MissingFunction("whitelist(address)")));
    }

    #[test]
    fn test_missing_function() {
        let abi = parse_abi(&REGISTRY_ABI.replace(r#""name":"shaExists""#, r#""name":"hashExists""#))
            .unwrap();
        let err = check_abi(&abi).unwrap_err();
        assert_eq!(err.to_string(), "ABI does not expose required function shaExists(bytes32)");
    }

    #[test]
    fn test_unexpected_format() {
        assert!(matches!(parse_abi("42"), Err(AbiError::UnexpectedFormat)));
        assert!(matches!(
            parse_abi(r#"{"bytecode":"0x"}"#),
            Err(AbiError::UnexpectedFormat)
        ));
        assert!(matches!(parse_abi("{"), Err(AbiError::Parse(_))));
    }
}
