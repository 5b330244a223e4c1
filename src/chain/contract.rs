//! Typed bindings for the invoice registry contract.

use alloy::primitives::{Address, Bytes, B256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::chain::client::Ledger;
use crate::chain::types::{ChainError, ChainResult, InvoiceRecord};

sol! {
    /// Invoice registry surface used by the submitter and verifiers.
    interface IInvoiceRegistry {
        struct Invoice {
            bytes32 sha256Hash;
            string hashcode;
            address issuer;
            uint256 timestamp;
            bool revoked;
            bool completed;
        }

        function whitelist(address signer) external view returns (bool);
        function getInvoice(string calldata hashcode) external view returns (Invoice memory);
        function shaExists(bytes32 sha256Hash) external view returns (bool);
        function paused() external view returns (bool);
        function owner() external view returns (address);
        function submitInvoice(bytes32 sha256Hash, string calldata hashcode) external;
    }
}

pub use IInvoiceRegistry::{
    getInvoiceCall, ownerCall, pausedCall, shaExistsCall, submitInvoiceCall, whitelistCall,
    IInvoiceRegistryCalls, Invoice,
};

/// Read-only view of a deployed registry through a [`Ledger`].
pub struct InvoiceRegistry<'a> {
    ledger: &'a dyn Ledger,
    address: Address,
}

impl<'a> InvoiceRegistry<'a> {
    pub fn new(ledger: &'a dyn Ledger, address: Address) -> Self {
        Self { ledger, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read<C: SolCall + Send>(&self, call: C) -> ChainResult<C::Return> {
        let output = self
            .ledger
            .call(self.address, Bytes::from(call.abi_encode()))
            .await?;
        C::abi_decode_returns(&output).map_err(|e| ChainError::Decode {
            method: C::SIGNATURE,
            reason: e.to_string(),
        })
    }

    /// Allow-list membership of `signer`.
    pub async fn whitelist(&self, signer: Address) -> ChainResult<bool> {
        self.read(whitelistCall { signer }).await
    }

    /// Stored state for a human identifier. Unknown codes come back with a
    /// zero timestamp rather than an error.
    pub async fn get_invoice(&self, hashcode: &str) -> ChainResult<InvoiceRecord> {
        let invoice = self
            .read(getInvoiceCall {
                hashcode: hashcode.to_string(),
            })
            .await?;
        Ok(InvoiceRecord::from(invoice))
    }

    /// Whether a content hash has been anchored.
    pub async fn sha_exists(&self, content_hash: B256) -> ChainResult<bool> {
        self.read(shaExistsCall {
            sha256Hash: content_hash,
        })
        .await
    }

    pub async fn paused(&self) -> ChainResult<bool> {
        self.read(pausedCall {}).await
    }

    pub async fn owner(&self) -> ChainResult<Address> {
        self.read(ownerCall {}).await
    }
}

/// Calldata for `submitInvoice(contentHash, humanId)`.
pub fn submit_invoice_calldata(content_hash: B256, human_id: &str) -> Bytes {
    Bytes::from(
        submitInvoiceCall {
            sha256Hash: content_hash,
            hashcode: human_id.to_string(),
        }
        .abi_encode(),
    )
}

impl From<Invoice> for InvoiceRecord {
    fn from(invoice: Invoice) -> Self {
        Self {
            content_hash: invoice.sha256Hash,
            hashcode: invoice.hashcode,
            issuer: invoice.issuer,
            timestamp: invoice.timestamp.saturating_to::<u64>(),
            revoked: invoice.revoked,
            completed: invoice.completed,
        }
    }
}

impl From<&InvoiceRecord> for Invoice {
    fn from(record: &InvoiceRecord) -> Self {
        Self {
            sha256Hash: record.content_hash,
            hashcode: record.hashcode.clone(),
            issuer: record.issuer,
            timestamp: alloy::primitives::U256::from(record.timestamp),
            revoked: record.revoked,
            completed: record.completed,
        }
    }
}
