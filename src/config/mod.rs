//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AnchorConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; one run, one config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The private key is never part of the config file; only the name of
//!   the environment variable holding it

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AnchorConfig, CacheConfig, ContractConfig, FeeConfig, LedgerConfig, LogFormat,
    ObservabilityConfig, ReceiptConfig, SignerConfig, UniquenessConfig,
};
pub use validation::ValidationError;
