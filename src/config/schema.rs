//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults so a minimal file (or none at all, with
//! environment overrides) is enough to run.

use serde::{Deserialize, Serialize};

/// Default alphabet for human identifiers (no `I`, `O`, `0`, `1`).
pub const DEFAULT_ID_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Root configuration for an anchoring run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnchorConfig {
    /// Ledger endpoint settings.
    pub ledger: LedgerConfig,

    /// Registry contract settings.
    pub contract: ContractConfig,

    /// Signer identity settings.
    pub signer: SignerConfig,

    /// Operator-fixed fee parameters.
    pub fees: FeeConfig,

    /// Identifier/hash generation settings.
    pub uniqueness: UniquenessConfig,

    /// Receipt wait settings.
    pub receipt: ReceiptConfig,

    /// Verification lookup cache.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Expected chain ID. When unset, whatever the endpoint reports is used.
    pub chain_id: Option<u64>,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Decimals of the native token, for display only.
    pub native_decimals: u8,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://westend-asset-hub-eth-rpc.polkadot.io".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            native_decimals: 12,
        }
    }
}

/// Registry contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the invoice registry.
    pub address: String,

    /// Optional ABI description file checked against the compiled interface.
    pub abi_path: Option<String>,
}

/// Signer identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Address the private key must derive to.
    pub expected_address: String,

    /// Environment variable holding the hex private key.
    pub private_key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            expected_address: String::new(),
            private_key_env: "PRIVATE_KEY".to_string(),
        }
    }
}

/// Fixed EIP-1559 fee parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Gas limit for the anchoring transaction.
    pub gas_limit: u64,

    /// Maximum total fee per gas, in gwei.
    pub max_fee_per_gas_gwei: u64,

    /// Maximum priority fee per gas, in gwei.
    pub max_priority_fee_per_gas_gwei: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            gas_limit: 300_000,
            max_fee_per_gas_gwei: 550,
            max_priority_fee_per_gas_gwei: 30,
        }
    }
}

/// Uniqueness generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UniquenessConfig {
    /// Maximum number of candidates to try before giving up.
    pub max_attempts: u32,

    /// Base pause between conflicting attempts in milliseconds.
    pub backoff_base_ms: u64,

    /// Upper bound for the pause in milliseconds.
    pub backoff_max_ms: u64,

    /// Characters used for the `XXXX` blocks of `INV-XXXX-XXXX`.
    pub alphabet: String,
}

impl Default for UniquenessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_base_ms: 100,
            backoff_max_ms: 1_000,
            alphabet: DEFAULT_ID_ALPHABET.to_string(),
        }
    }
}

/// Receipt wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Hard deadline for the receipt in seconds.
    pub timeout_secs: u64,

    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 2_000,
        }
    }
}

/// Verification lookup cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of a cached invoice lookup in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}
