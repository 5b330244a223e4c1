//! Ledger RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (chain id, balances, nonces, code)
//! - Read-only contract calls (with failover)
//! - Raw transaction broadcast (primary only, never repeated)
//! - Receipt polling under a hard deadline
//! - Keep "endpoint unreachable" distinct from "node rejected the call"

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportResult};
use async_trait::async_trait;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::chain::types::{ChainError, ChainResult, ReceiptStatus, SubmissionReceipt};
use crate::config::LedgerConfig;
use crate::observability::metrics;

/// Remote surface of an account-based ledger.
///
/// Implemented by [`RpcLedger`] for real endpoints; tests substitute an
/// in-memory ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Chain ID served by the endpoint.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Native balance of `address` in the smallest unit.
    async fn balance_of(&self, address: Address) -> ChainResult<U256>;

    /// Transaction count (next nonce) of `address`.
    async fn nonce_of(&self, address: Address) -> ChainResult<u64>;

    /// Deployed bytecode at `address`; empty when nothing is deployed.
    async fn code_at(&self, address: Address) -> ChainResult<Bytes>;

    /// Read-only call. No state change, no gas spent.
    async fn call(&self, to: Address, input: Bytes) -> ChainResult<Bytes>;

    /// Broadcast signed EIP-2718 bytes once; returns the transaction hash.
    ///
    /// A connectivity error here leaves the transaction's fate unknown.
    async fn send_raw(&self, raw: Bytes) -> ChainResult<TxHash>;

    /// Receipt for `tx_hash`, or `None` while the transaction is pending.
    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<SubmissionReceipt>>;

    /// Poll for a receipt until one arrives or `deadline` elapses.
    ///
    /// Errors while polling are logged and polling continues; only the
    /// deadline ends the wait. A timeout means the outcome is unknown: the
    /// transaction may still confirm later.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        deadline: Duration,
        poll_interval: Duration,
    ) -> ChainResult<SubmissionReceipt> {
        let result = timeout(deadline, async {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.receipt(tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    }
                    Err(e) => {
                        tracing::warn!(
                            tx_hash = %tx_hash,
                            error = %e,
                            "Receipt poll failed, will retry until deadline"
                        );
                    }
                }
            }
        })
        .await;

        result.map_err(|_| ChainError::ReceiptTimeout {
            tx_hash,
            waited_secs: deadline.as_secs(),
        })
    }
}

type SharedProvider = Arc<dyn Provider + Send + Sync>;

/// JSON-RPC ledger client with failover support.
#[derive(Clone)]
pub struct RpcLedger {
    /// List of providers (primary + failovers).
    providers: Vec<SharedProvider>,
    /// Primary endpoint, for diagnostics.
    rpc_url: String,
    /// Per-request timeout.
    timeout_duration: Duration,
}

impl RpcLedger {
    /// Connect to the configured endpoint and probe it.
    ///
    /// Unlike a long-running service this does not degrade gracefully: an
    /// endpoint that cannot answer `eth_chainId` fails the run with a
    /// connectivity error before anything else happens.
    pub async fn connect(config: &LedgerConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers: Vec<SharedProvider> = Vec::new();

        let primary_url: url::Url =
            config
                .rpc_url
                .parse()
                .map_err(|e: url::ParseError| ChainError::InvalidEndpoint {
                    url: config.rpc_url.clone(),
                    reason: e.to_string(),
                })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)));

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(Arc::new(ProviderBuilder::new().connect_http(url))),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let ledger = Self {
            providers,
            rpc_url: config.rpc_url.clone(),
            timeout_duration,
        };

        let chain_id = ledger.chain_id().await?;
        if let Some(expected) = config.chain_id {
            if expected != chain_id {
                return Err(ChainError::ChainMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        tracing::info!(
            rpc_url = %ledger.rpc_url,
            chain_id = chain_id,
            failovers = ledger.providers.len() - 1,
            "Ledger client connected"
        );

        Ok(ledger)
    }

    /// Run `op` against each provider in turn.
    ///
    /// Transport failures and timeouts move on to the next provider. A
    /// JSON-RPC error response is the node's verdict on the request itself
    /// and is returned immediately as [`ChainError::Call`].
    async fn with_failover<T, F, Fut>(&self, op: &'static str, request: F) -> ChainResult<T>
    where
        F: Fn(SharedProvider) -> Fut + Send + Sync,
        Fut: Future<Output = TransportResult<T>> + Send,
        T: Send,
    {
        let mut last_error = String::from("no providers configured");

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, request(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(RpcError::ErrorResp(payload))) => {
                    tracing::debug!(op = op, error = %payload, "RPC call rejected");
                    return Err(record(ChainError::Call(payload.to_string())));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, op = op, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op = op, "RPC timeout, trying next provider");
                    last_error = format!("timed out after {}s", self.timeout_duration.as_secs());
                }
            }
        }

        Err(record(ChainError::Connectivity(format!(
            "{}: all RPC providers failed ({})",
            op, last_error
        ))))
    }

    /// Run `op` once against the primary provider, without failover.
    ///
    /// Used for requests that must not be repeated, such as a broadcast: a
    /// timeout here does not mean the node never saw the request.
    async fn on_primary<T, Fut>(&self, op: &'static str, request: Fut) -> ChainResult<T>
    where
        Fut: Future<Output = TransportResult<T>> + Send,
        T: Send,
    {
        match timeout(self.timeout_duration, request).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(RpcError::ErrorResp(payload))) => {
                tracing::debug!(op = op, error = %payload, "RPC call rejected");
                Err(record(ChainError::Call(payload.to_string())))
            }
            Ok(Err(e)) => {
                tracing::warn!(op = op, error = %e, "RPC error on primary provider");
                Err(record(ChainError::Connectivity(format!("{}: {}", op, e))))
            }
            Err(_) => {
                tracing::warn!(op = op, "RPC timeout on primary provider");
                Err(record(ChainError::Connectivity(format!(
                    "{}: timed out after {}s",
                    op,
                    self.timeout_duration.as_secs()
                ))))
            }
        }
    }
}

fn record(err: ChainError) -> ChainError {
    metrics::record_rpc_error(err.kind());
    err
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn chain_id(&self) -> ChainResult<u64> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn balance_of(&self, address: Address) -> ChainResult<U256> {
        self.with_failover("eth_getBalance", move |p| async move {
            p.get_balance(address).await
        })
        .await
    }

    async fn nonce_of(&self, address: Address) -> ChainResult<u64> {
        self.with_failover("eth_getTransactionCount", move |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    async fn code_at(&self, address: Address) -> ChainResult<Bytes> {
        self.with_failover("eth_getCode", move |p| async move {
            p.get_code_at(address).await
        })
        .await
    }

    async fn call(&self, to: Address, input: Bytes) -> ChainResult<Bytes> {
        self.with_failover("eth_call", |p| {
            let tx = TransactionRequest::default()
                .with_to(to)
                .with_input(input.clone());
            async move { p.call(tx).await }
        })
        .await
    }

    async fn send_raw(&self, raw: Bytes) -> ChainResult<TxHash> {
        let primary = self.providers.first().cloned().ok_or_else(|| {
            ChainError::Connectivity("eth_sendRawTransaction: no providers configured".into())
        })?;
        self.on_primary("eth_sendRawTransaction", async move {
            primary
                .send_raw_transaction(&raw)
                .await
                .map(|pending| *pending.tx_hash())
        })
        .await
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<SubmissionReceipt>> {
        let receipt = self
            .with_failover("eth_getTransactionReceipt", move |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.as_ref().map(to_submission_receipt))
    }
}

fn to_submission_receipt(receipt: &TransactionReceipt) -> SubmissionReceipt {
    SubmissionReceipt {
        transaction_id: receipt.transaction_hash,
        block_number: receipt.block_number.unwrap_or_default(),
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
        status: if receipt.status() {
            ReceiptStatus::Success
        } else {
            ReceiptStatus::Failed
        },
    }
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
