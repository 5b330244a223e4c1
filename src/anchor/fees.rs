//! Operator-fixed EIP-1559 fee parameters.

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;

use crate::anchor::error::AnchorError;
use crate::config::FeeConfig;

pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Gas limit and fee caps for the anchoring transaction, in wei.
///
/// Fixed for a run and never derived from network conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeParameters {
    pub fn from_config(config: &FeeConfig) -> Self {
        Self {
            gas_limit: config.gas_limit,
            max_fee_per_gas: u128::from(config.max_fee_per_gas_gwei) * WEI_PER_GWEI,
            max_priority_fee_per_gas: u128::from(config.max_priority_fee_per_gas_gwei)
                * WEI_PER_GWEI,
        }
    }

    /// Reject parameters no node would accept.
    pub fn validate(&self) -> Result<(), AnchorError> {
        if self.gas_limit == 0 {
            return Err(AnchorError::Build("gas limit must be greater than zero".into()));
        }
        if self.max_priority_fee_per_gas > self.max_fee_per_gas {
            return Err(AnchorError::Build(format!(
                "max priority fee {} wei exceeds max fee {} wei",
                self.max_priority_fee_per_gas, self.max_fee_per_gas
            )));
        }
        Ok(())
    }

    /// Upper bound on what the transaction can cost.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.max_fee_per_gas)
    }
}

/// Render a wei-per-gas amount in gwei for operator output.
pub fn format_gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei").unwrap_or_else(|_| format!("{} wei", wei))
}
