//! Signing identity resolution.
//!
//! # Security
//! - The private key is read from the environment into zeroizing memory
//! - Keys are never logged or serialized; `Debug` output is redacted
//! - The derived address must equal the operator-configured address before
//!   anything else happens

use std::fmt;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use zeroize::Zeroizing;

use crate::anchor::error::AnchorError;

/// Hex-encoded private key held in memory that is wiped on drop.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(Zeroizing::new(hex.into()))
    }

    /// Read the key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, AnchorError> {
        std::env::var(var)
            .map(Self::new)
            .map_err(|_| AnchorError::Config(format!("environment variable {} not set", var)))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***REDACTED***)")
    }
}

/// Key plus the address it derives to, for the lifetime of one run.
pub struct SigningIdentity {
    signer: PrivateKeySigner,
    address: Address,
}

impl SigningIdentity {
    /// Parse a hex private key, with or without `0x`.
    ///
    /// Malformed key material is a signing failure, not a mismatch.
    pub fn from_private_key(key: &SecretKey) -> Result<Self, AnchorError> {
        let trimmed = key.expose().trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| AnchorError::Sign(format!("invalid private key format: {}", e)))?;
        let address = signer.address();

        Ok(Self { signer, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash (transaction signature hash).
    pub fn sign_hash(&self, hash: &B256) -> Result<Signature, AnchorError> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|e| AnchorError::Sign(e.to_string()))
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the identity and require it to equal `expected`.
///
/// Addresses compare as 20-byte values, so the letter case (checksum or
/// not) of the configured address does not matter.
pub fn resolve(key: &SecretKey, expected: Address) -> Result<SigningIdentity, AnchorError> {
    let identity = SigningIdentity::from_private_key(key)?;

    if identity.address != expected {
        tracing::error!(
            derived = %identity.address,
            expected = %expected,
            "Wallet address mismatch"
        );
        return Err(AnchorError::IdentityMismatch {
            derived: identity.address,
            expected,
        });
    }

    tracing::info!(address = %identity.address, "Signer identity resolved");
    Ok(identity)
}
