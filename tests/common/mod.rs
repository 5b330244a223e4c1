//! Shared utilities for integration testing: an in-memory ledger that
//! emulates the invoice registry, and a scriptable JSON-RPC endpoint.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolInterface};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use invoice_anchor::anchor::{
    FeeParameters, ReceiptPolicy, RunSettings, SecretKey, UniquenessPolicy,
};
use invoice_anchor::chain::contract::{
    getInvoiceCall, ownerCall, pausedCall, shaExistsCall, submitInvoiceCall, whitelistCall,
    IInvoiceRegistryCalls, Invoice,
};
use invoice_anchor::chain::{ChainError, ChainResult, InvoiceRecord, Ledger, ReceiptStatus, SubmissionReceipt};
use invoice_anchor::config::schema::DEFAULT_ID_ALPHABET;
use invoice_anchor::resilience::Backoff;

// Well-known test private key (Anvil's first account)
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const OTHER_ADDRESS: &str = "0xeb202166015976623cde87d4f2caef41abdb7177";
pub const CONTRACT_ADDRESS: &str = "0x19c8500bf08ddc7941801fb629a4307c2bcdcd7e";
pub const CHAIN_ID: u64 = 420420421;

pub fn test_key() -> SecretKey {
    SecretKey::new(TEST_PRIVATE_KEY)
}

pub fn test_address() -> Address {
    TEST_ADDRESS.parse().unwrap()
}

pub fn contract_address() -> Address {
    CONTRACT_ADDRESS.parse().unwrap()
}

/// Settings tuned for tests: no backoff pause, short receipt polling.
pub fn test_settings() -> RunSettings {
    RunSettings {
        contract: contract_address(),
        expected_address: test_address(),
        fees: FeeParameters {
            gas_limit: 300_000,
            max_fee_per_gas: 550_000_000_000,
            max_priority_fee_per_gas: 30_000_000_000,
        },
        uniqueness: UniquenessPolicy {
            max_attempts: 10,
            backoff: Backoff::from_millis(0, 0),
            alphabet: DEFAULT_ID_ALPHABET.as_bytes().to_vec(),
        },
        receipt: ReceiptPolicy {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
        },
    }
}

/// How the mock answers receipt queries for broadcast transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    /// Included with status 1.
    Success,
    /// Included with status 0.
    Failed,
    /// Never included.
    Pending,
}

#[derive(Debug)]
struct RegistryState {
    whitelist: HashSet<Address>,
    paused: bool,
    owner: Address,
    code: Bytes,
    balance: U256,
    nonce: u64,
    invoices: HashMap<String, InvoiceRecord>,
    hashes: HashSet<B256>,
    id_conflicts: u32,
    hash_conflicts: u32,
    broadcast_error: Option<String>,
    /// The node accepts the transaction but the reply never arrives.
    drop_broadcast_reply: bool,
    receipt_mode: ReceiptMode,
    /// Whether a successful transaction actually stores the invoice.
    record_on_success: bool,
    unreachable: bool,
    receipts: HashMap<TxHash, SubmissionReceipt>,
    submitted: Vec<(String, B256)>,
}

/// In-memory ledger emulating the invoice registry contract.
///
/// Calldata is decoded with the same bindings the crate uses, so a
/// malformed encoding fails the test rather than passing silently.
#[derive(Debug)]
pub struct MockLedger {
    state: Mutex<RegistryState>,
    requests: AtomicU32,
    sends: AtomicU32,
}

impl MockLedger {
    /// A healthy registry that allow-lists the test account.
    pub fn new() -> Self {
        let mut whitelist = HashSet::new();
        whitelist.insert(test_address());
        Self {
            state: Mutex::new(RegistryState {
                whitelist,
                paused: false,
                owner: OTHER_ADDRESS.parse().unwrap(),
                code: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
                balance: U256::from(10u64).pow(U256::from(18u64)),
                nonce: 5,
                invoices: HashMap::new(),
                hashes: HashSet::new(),
                id_conflicts: 0,
                hash_conflicts: 0,
                broadcast_error: None,
                drop_broadcast_reply: false,
                receipt_mode: ReceiptMode::Success,
                record_on_success: true,
                unreachable: false,
                receipts: HashMap::new(),
                submitted: Vec::new(),
            }),
            requests: AtomicU32::new(0),
            sends: AtomicU32::new(0),
        }
    }

    fn with_state(mut self, f: impl FnOnce(&mut RegistryState)) -> Self {
        f(self.state.get_mut().unwrap());
        self
    }

    pub fn without_whitelist(self) -> Self {
        self.with_state(|s| s.whitelist.clear())
    }

    pub fn paused(self) -> Self {
        self.with_state(|s| s.paused = true)
    }

    pub fn without_code(self) -> Self {
        self.with_state(|s| s.code = Bytes::new())
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.with_state(|s| s.balance = balance)
    }

    /// The next `n` identifier lookups report the identifier as taken.
    pub fn with_id_conflicts(self, n: u32) -> Self {
        self.with_state(|s| s.id_conflicts = n)
    }

    /// The next `n` hash lookups report the hash as taken.
    pub fn with_hash_conflicts(self, n: u32) -> Self {
        self.with_state(|s| s.hash_conflicts = n)
    }

    pub fn rejecting_broadcast(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_state(|s| s.broadcast_error = Some(message))
    }

    /// Transactions are applied, then the connection drops before the
    /// hash is returned.
    pub fn dropping_broadcast_reply(self) -> Self {
        self.with_state(|s| s.drop_broadcast_reply = true)
    }

    pub fn with_receipt_mode(self, mode: ReceiptMode) -> Self {
        self.with_state(|s| s.receipt_mode = mode)
    }

    /// Successful receipts that leave the registry unchanged.
    pub fn not_recording(self) -> Self {
        self.with_state(|s| s.record_on_success = false)
    }

    pub fn unreachable(self) -> Self {
        self.with_state(|s| s.unreachable = true)
    }

    /// Store an anchored invoice directly.
    pub fn with_invoice(self, code: &str, content_hash: B256, revoked: bool, completed: bool) -> Self {
        let record = InvoiceRecord {
            content_hash,
            hashcode: code.to_string(),
            issuer: test_address(),
            timestamp: 1_700_000_000,
            revoked,
            completed,
        };
        self.with_state(|s| {
            s.hashes.insert(content_hash);
            s.invoices.insert(code.to_string(), record);
        })
    }

    /// Ledger requests of any kind served so far.
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Raw transactions received so far.
    pub fn sends(&self) -> u32 {
        self.sends.load(Ordering::SeqCst)
    }

    /// (identifier, hash) pairs carried by received transactions.
    pub fn submitted(&self) -> Vec<(String, B256)> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn is_anchored(&self, code: &str) -> bool {
        self.state.lock().unwrap().invoices.contains_key(code)
    }

    fn enter(&self) -> ChainResult<std::sync::MutexGuard<'_, RegistryState>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(ChainError::Connectivity(
                "all RPC providers failed: connection refused".into(),
            ));
        }
        Ok(state)
    }

    fn apply_transaction(state: &mut RegistryState, raw: &[u8]) -> ChainResult<TxHash> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| ChainError::Call(format!("invalid transaction: {}", e)))?;
        let tx_hash = *envelope.tx_hash();

        let TxEnvelope::Eip1559(signed) = envelope else {
            return Err(ChainError::Call("only EIP-1559 transactions accepted".into()));
        };
        let sender = signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .map_err(|e| ChainError::Call(format!("invalid signature: {}", e)))?;

        let tx = signed.tx();
        if tx.nonce != state.nonce {
            return Err(ChainError::Call(format!(
                "nonce mismatch: expected {}, got {}",
                state.nonce, tx.nonce
            )));
        }
        let call = submitInvoiceCall::abi_decode(&tx.input)
            .map_err(|e| ChainError::Call(format!("execution reverted: {}", e)))?;

        state.nonce += 1;
        state
            .submitted
            .push((call.hashcode.clone(), call.sha256Hash));

        let status = match state.receipt_mode {
            ReceiptMode::Pending => return Ok(tx_hash),
            ReceiptMode::Failed => ReceiptStatus::Failed,
            ReceiptMode::Success => ReceiptStatus::Success,
        };

        if status == ReceiptStatus::Success && state.record_on_success {
            state.hashes.insert(call.sha256Hash);
            state.invoices.insert(
                call.hashcode.clone(),
                InvoiceRecord {
                    content_hash: call.sha256Hash,
                    hashcode: call.hashcode,
                    issuer: sender,
                    timestamp: 1_700_000_000,
                    revoked: false,
                    completed: false,
                },
            );
        }

        state.receipts.insert(
            tx_hash,
            SubmissionReceipt {
                transaction_id: tx_hash,
                block_number: 1_234,
                gas_used: 120_000,
                effective_gas_price: 31_000_000_000,
                status,
            },
        );
        Ok(tx_hash)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn chain_id(&self) -> ChainResult<u64> {
        self.enter()?;
        Ok(CHAIN_ID)
    }

    async fn balance_of(&self, _address: Address) -> ChainResult<U256> {
        Ok(self.enter()?.balance)
    }

    async fn nonce_of(&self, _address: Address) -> ChainResult<u64> {
        Ok(self.enter()?.nonce)
    }

    async fn code_at(&self, _address: Address) -> ChainResult<Bytes> {
        Ok(self.enter()?.code.clone())
    }

    async fn call(&self, _to: Address, input: Bytes) -> ChainResult<Bytes> {
        let mut state = self.enter()?;
        let call = IInvoiceRegistryCalls::abi_decode(&input)
            .map_err(|e| ChainError::Call(format!("execution reverted: {}", e)))?;

        let output = match call {
            IInvoiceRegistryCalls::whitelist(c) => {
                whitelistCall::abi_encode_returns(&state.whitelist.contains(&c.signer))
            }
            IInvoiceRegistryCalls::getInvoice(c) => {
                let invoice = if state.id_conflicts > 0 {
                    state.id_conflicts -= 1;
                    Invoice {
                        sha256Hash: B256::repeat_byte(0xee),
                        hashcode: c.hashcode.clone(),
                        issuer: state.owner,
                        timestamp: U256::from(1_600_000_000u64),
                        revoked: false,
                        completed: false,
                    }
                } else {
                    match state.invoices.get(&c.hashcode) {
                        Some(record) => Invoice::from(record),
                        None => Invoice {
                            sha256Hash: B256::ZERO,
                            hashcode: String::new(),
                            issuer: Address::ZERO,
                            timestamp: U256::ZERO,
                            revoked: false,
                            completed: false,
                        },
                    }
                };
                getInvoiceCall::abi_encode_returns(&invoice)
            }
            IInvoiceRegistryCalls::shaExists(c) => {
                let exists = if state.hash_conflicts > 0 {
                    state.hash_conflicts -= 1;
                    true
                } else {
                    state.hashes.contains(&c.sha256Hash)
                };
                shaExistsCall::abi_encode_returns(&exists)
            }
            IInvoiceRegistryCalls::paused(_) => pausedCall::abi_encode_returns(&state.paused),
            IInvoiceRegistryCalls::owner(_) => ownerCall::abi_encode_returns(&state.owner),
            IInvoiceRegistryCalls::submitInvoice(_) => {
                return Err(ChainError::Call(
                    "execution reverted: state change in eth_call".into(),
                ))
            }
        };
        Ok(Bytes::from(output))
    }

    async fn send_raw(&self, raw: Bytes) -> ChainResult<TxHash> {
        let mut state = self.enter()?;
        self.sends.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &state.broadcast_error {
            return Err(ChainError::Call(message.clone()));
        }
        let tx_hash = Self::apply_transaction(&mut state, &raw)?;
        if state.drop_broadcast_reply {
            return Err(ChainError::Connectivity(
                "eth_sendRawTransaction: connection reset by peer".into(),
            ));
        }
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<SubmissionReceipt>> {
        Ok(self.enter()?.receipts.get(&tx_hash).cloned())
    }
}

/// How a scripted endpoint answers one JSON-RPC method.
#[derive(Debug, Clone)]
pub enum RpcReply {
    Result(Value),
    Error { code: i64, message: String },
    /// Read the request, then never answer.
    Hang,
}

/// A local HTTP JSON-RPC endpoint driven by a reply function.
#[derive(Debug, Clone)]
pub struct RpcEndpoint {
    pub addr: SocketAddr,
    broadcasts: Arc<AtomicU32>,
}

impl RpcEndpoint {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `eth_sendRawTransaction` requests received so far.
    pub fn broadcasts(&self) -> u32 {
        self.broadcasts.load(Ordering::SeqCst)
    }
}

/// Start an endpoint on an ephemeral local port. `reply` maps a method
/// name to its answer; the request id is echoed back.
pub async fn start_rpc_endpoint<F>(reply: F) -> RpcEndpoint
where
    F: Fn(&str) -> RpcReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let broadcasts = Arc::new(AtomicU32::new(0));
    let reply = Arc::new(reply);

    let counter = broadcasts.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let reply = reply.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        serve_rpc(socket, reply.as_ref(), &counter).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    RpcEndpoint { addr, broadcasts }
}

async fn serve_rpc<F>(mut socket: TcpStream, reply: &F, broadcasts: &AtomicU32)
where
    F: Fn(&str) -> RpcReply,
{
    let Some(body) = read_http_body(&mut socket).await else {
        return;
    };
    let Ok(request) = serde_json::from_slice::<Value>(&body) else {
        return;
    };
    let method = request["method"].as_str().unwrap_or_default().to_string();
    if method == "eth_sendRawTransaction" {
        broadcasts.fetch_add(1, Ordering::SeqCst);
    }

    let payload = match reply(&method) {
        RpcReply::Result(result) => {
            json!({ "jsonrpc": "2.0", "id": request["id"], "result": result })
        }
        RpcReply::Error { code, message } => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": code, "message": message }
        }),
        RpcReply::Hang => {
            std::future::pending::<()>().await;
            return;
        }
    };

    let body = payload.to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Read one HTTP request and return its body, sized by Content-Length.
async fn read_http_body(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(buf[header_end..header_end + content_length].to_vec())
}
