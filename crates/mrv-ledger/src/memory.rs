//! An in-process ledger node for tests and offline runs.
//!
//! [`MemoryChain`] answers the JSON-RPC calls [`crate::LedgerClient`] makes
//! and hosts one registry contract. Transactions are fully decoded and their
//! signatures checked, so the client's encoding and signing paths run for
//! real. Every transaction is mined into its own block immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::debug;

use mrv_core::Digest;

use crate::abi::{self, RecordTuple, RegistryCall};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::eth::{decode_hex, encode_hex, to_quantity, Address, TxHash};
use crate::transport::RpcTransport;
use crate::tx::SignedTransaction;

/// Chain id of a fresh node (the usual local development id).
pub const DEFAULT_CHAIN_ID: u64 = 1337;

/// Address the registry is deployed at.
pub const REGISTRY_ADDRESS: Address = Address([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64,
    0x2f, 0x64, 0x18, 0x0a, 0xa3,
]);

const CLIENT_VERSION: &str = concat!("MemoryChain/v", env!("CARGO_PKG_VERSION"));
const GAS_PRICE: u128 = 1_000_000_000;
const INTRINSIC_GAS: u64 = 21_000;

/// JSON-RPC error code for invalid method parameters.
const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code for unknown methods.
const METHOD_NOT_FOUND: i64 = -32601;
/// Generic server error code nodes use for rejected transactions.
const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Clone)]
struct StoredReceipt {
    status: bool,
    block_number: u64,
    from: Address,
    to: Address,
    logs: Vec<Value>,
    polls_remaining: u32,
}

#[derive(Debug, Default)]
struct ChainState {
    registry: HashMap<String, RecordTuple>,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<TxHash, StoredReceipt>,
    block_number: u64,
    block_time: u64,
}

impl ChainState {
    /// Mine a block, returning its number and timestamp.
    fn mine(&mut self) -> (u64, u64) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.block_number += 1;
        self.block_time = now.max(self.block_time + 1);
        (self.block_number, self.block_time)
    }
}

/// In-process node hosting the record registry.
#[derive(Debug)]
pub struct MemoryChain {
    chain_id: u64,
    contract: Address,
    receipt_delay: u32,
    online: AtomicBool,
    state: Mutex<ChainState>,
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChain {
    pub fn new() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            contract: REGISTRY_ADDRESS,
            receipt_delay: 0,
            online: AtomicBool::new(true),
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Answer `eth_getTransactionReceipt` with `null` this many times before
    /// returning a receipt.
    pub fn with_receipt_delay(mut self, polls: u32) -> Self {
        self.receipt_delay = polls;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Ledger config pointing at this node's registry. Add a key to anchor.
    pub fn client_config(&self) -> LedgerConfig {
        LedgerConfig::default()
            .with_rpc_url("memory://")
            .with_contract_address(self.contract.to_hex())
    }

    /// Simulate the node going away (every call fails at the transport).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Number of transactions mined so far.
    pub fn transaction_count(&self) -> usize {
        self.state().map(|s| s.receipts.len()).unwrap_or(0)
    }

    /// Next nonce for `address`.
    pub fn nonce_of(&self, address: &Address) -> u64 {
        self.state()
            .map(|s| s.nonces.get(address).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Whether a mined transaction succeeded.
    pub fn receipt_status(&self, tx_hash: &TxHash) -> Option<bool> {
        self.state().ok()?.receipts.get(tx_hash).map(|r| r.status)
    }

    /// The registry entry for `id`, bypassing RPC.
    pub fn registration(&self, id: &str) -> Option<RecordTuple> {
        self.state().ok()?.registry.get(id).copied()
    }

    fn state(&self) -> Result<MutexGuard<'_, ChainState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Transport("node state poisoned".into()))
    }

    fn send_raw_transaction(&self, state: &mut ChainState, raw_hex: &str) -> Result<Value> {
        let raw = decode_hex(raw_hex).map_err(invalid_params)?;
        let signed = SignedTransaction::decode(&raw).map_err(rejected)?;
        if signed.tx.chain_id != self.chain_id {
            return Err(server_error(format!(
                "invalid chain id {} (node is {})",
                signed.tx.chain_id, self.chain_id
            )));
        }
        let from = signed.recover_sender().map_err(rejected)?;

        let expected = state.nonces.get(&from).copied().unwrap_or(0);
        if signed.tx.nonce < expected {
            return Err(server_error("nonce too low".into()));
        }
        if signed.tx.nonce > expected {
            return Err(server_error("nonce too high".into()));
        }
        if signed.tx.gas_limit < INTRINSIC_GAS {
            return Err(server_error("intrinsic gas too low".into()));
        }

        state.nonces.insert(from, expected + 1);
        let (block_number, block_time) = state.mine();
        let (status, logs) = self.execute(state, &signed, from, block_time);

        let tx_hash = TxHash::of_raw(&raw);
        debug!(tx_hash = %tx_hash, block_number, status, "transaction mined");
        state.receipts.insert(
            tx_hash,
            StoredReceipt {
                status,
                block_number,
                from,
                to: signed.tx.to,
                logs,
                polls_remaining: self.receipt_delay,
            },
        );
        Ok(json!(tx_hash.to_hex()))
    }

    /// Apply a mined transaction. A registration for an id that is already
    /// present reverts.
    fn execute(
        &self,
        state: &mut ChainState,
        signed: &SignedTransaction,
        from: Address,
        block_time: u64,
    ) -> (bool, Vec<Value>) {
        if signed.tx.to != self.contract {
            return (true, Vec::new());
        }
        match abi::decode_call(&signed.tx.data) {
            Ok(RegistryCall::RegisterRecord { id, digest }) => {
                if state.registry.contains_key(&id) {
                    debug!(mrv_id = %id, "registration reverted: id already registered");
                    return (false, Vec::new());
                }
                let log = self.registered_log(&id, &digest, block_time, &from);
                state.registry.insert(
                    id,
                    RecordTuple {
                        digest,
                        timestamp: block_time,
                        submitter: from,
                    },
                );
                (true, vec![log])
            }
            Ok(_) => (true, Vec::new()),
            Err(_) => (false, Vec::new()),
        }
    }

    fn registered_log(&self, id: &str, digest: &Digest, timestamp: u64, from: &Address) -> Value {
        json!({
            "address": self.contract.to_hex(),
            "topics": [
                encode_hex(&abi::record_registered_topic()),
                encode_hex(&crate::eth::keccak256(id.as_bytes())),
                encode_hex(&abi::address_word(from)),
            ],
            "data": encode_hex(&abi::encode_record_registered_data(digest, timestamp)),
        })
    }

    fn transaction_receipt(&self, state: &mut ChainState, hash_hex: &str) -> Result<Value> {
        let tx_hash = TxHash::from_hex(hash_hex).map_err(invalid_params)?;
        let Some(receipt) = state.receipts.get_mut(&tx_hash) else {
            return Ok(Value::Null);
        };
        if receipt.polls_remaining > 0 {
            receipt.polls_remaining -= 1;
            return Ok(Value::Null);
        }
        Ok(json!({
            "transactionHash": tx_hash.to_hex(),
            "blockNumber": to_quantity(u128::from(receipt.block_number)),
            "from": receipt.from.to_hex(),
            "to": receipt.to.to_hex(),
            "gasUsed": to_quantity(u128::from(INTRINSIC_GAS)),
            "status": if receipt.status { "0x1" } else { "0x0" },
            "logs": receipt.logs,
        }))
    }

    fn call_contract(&self, state: &ChainState, call: &Value) -> Result<Value> {
        let to = call
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("eth_call requires a `to` field"))?;
        let to = Address::from_hex(to).map_err(invalid_params)?;
        if to != self.contract {
            return Ok(json!("0x"));
        }

        let data = call
            .get("data")
            .or_else(|| call.get("input"))
            .and_then(Value::as_str)
            .map(decode_hex)
            .transpose()
            .map_err(invalid_params)?
            .unwrap_or_default();

        let output = match abi::decode_call(&data).map_err(|e| server_error(format!("execution reverted: {}", e)))? {
            RegistryCall::GetRecord { id } => {
                let tuple = state.registry.get(&id).copied().unwrap_or(RecordTuple {
                    digest: Digest::ZERO,
                    timestamp: 0,
                    submitter: Address::ZERO,
                });
                abi::encode_get_record_output(&tuple)
            }
            RegistryCall::IsRegistered { id } => abi::encode_bool(state.registry.contains_key(&id)),
            RegistryCall::RegisterRecord { .. } => Vec::new(),
        };
        Ok(json!(encode_hex(&output)))
    }
}

impl RpcTransport for MemoryChain {
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        if !self.is_online() {
            return Err(LedgerError::Transport("connection refused".into()));
        }
        let mut state = self.state()?;

        match method {
            "web3_clientVersion" => Ok(json!(CLIENT_VERSION)),
            "eth_chainId" => Ok(json!(to_quantity(u128::from(self.chain_id)))),
            "eth_gasPrice" => Ok(json!(to_quantity(GAS_PRICE))),
            "eth_blockNumber" => Ok(json!(to_quantity(u128::from(state.block_number)))),
            "eth_getTransactionCount" => {
                let address = Address::from_hex(param_str(&params, 0)?).map_err(invalid_params)?;
                let nonce = state.nonces.get(&address).copied().unwrap_or(0);
                Ok(json!(to_quantity(u128::from(nonce))))
            }
            "eth_sendRawTransaction" => {
                self.send_raw_transaction(&mut state, param_str(&params, 0)?)
            }
            "eth_getTransactionReceipt" => {
                self.transaction_receipt(&mut state, param_str(&params, 0)?)
            }
            "eth_call" => {
                let call = params
                    .get(0)
                    .ok_or_else(|| invalid_params("missing call object"))?;
                self.call_contract(&state, call)
            }
            other => Err(LedgerError::Rpc {
                code: METHOD_NOT_FOUND,
                message: format!("the method {} does not exist/is not available", other),
            }),
        }
    }
}

fn param_str(params: &Value, index: usize) -> Result<&str> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params(format!("missing string parameter {}", index)))
}

fn invalid_params(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Rpc {
        code: INVALID_PARAMS,
        message: e.to_string(),
    }
}

fn server_error(message: String) -> LedgerError {
    LedgerError::Rpc {
        code: SERVER_ERROR,
        message,
    }
}

fn rejected(e: LedgerError) -> LedgerError {
    server_error(format!("invalid transaction: {}", e))
}
