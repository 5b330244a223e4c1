//! Allow-list and pause checks against the registry.

use alloy::primitives::Address;

use crate::anchor::error::AnchorError;
use crate::chain::InvoiceRegistry;

/// Require `address` to be on the registry allow-list.
///
/// A failed lookup propagates; it is never read as "authorized".
pub async fn check_authorization(
    registry: &InvoiceRegistry<'_>,
    address: Address,
) -> Result<(), AnchorError> {
    let allowed = registry.whitelist(address).await?;
    tracing::info!(address = %address, allowed = allowed, "Whitelist status");

    if !allowed {
        tracing::error!(address = %address, "Address not whitelisted");
        return Err(AnchorError::AuthorizationDenied(address));
    }
    Ok(())
}

/// Refuse to submit into a paused registry.
pub async fn check_not_paused(registry: &InvoiceRegistry<'_>) -> Result<(), AnchorError> {
    if registry.paused().await? {
        tracing::error!(contract = %registry.address(), "Registry is paused");
        return Err(AnchorError::ContractPaused(registry.address()));
    }
    Ok(())
}
