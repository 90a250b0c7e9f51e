//! Ledger client: anchoring and looking up record digests in the registry
//! contract.
//!
//! Every public operation is best-effort. Infrastructure failures are logged
//! and degrade to `None`/`false`; they never surface as errors to the
//! caller.

use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use mrv_core::Digest;

use crate::abi;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::eth::{decode_hex, encode_hex, parse_quantity, Address, TxHash};
use crate::transport::{HttpTransport, RpcTransport};
use crate::tx::{LegacyTransaction, Signer};

/// An on-chain anchor for one record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerAnchor {
    /// Digest registered for the id.
    pub digest: Digest,
    /// Block time of the registration, in Unix seconds.
    pub timestamp: u64,
    /// Account that submitted the registration.
    pub submitter: Address,
}

/// Client for the record registry contract.
pub struct LedgerClient<T: RpcTransport = HttpTransport> {
    transport: T,
    config: LedgerConfig,
    contract: Option<Address>,
    signer: Option<Signer>,
    chain_id: OnceLock<u64>,
}

impl LedgerClient<HttpTransport> {
    /// Client speaking JSON-RPC over HTTP to `config.rpc_url`.
    pub fn http(config: LedgerConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.rpc_url.clone(), config.request_timeout)?;
        Self::new(transport, config)
    }
}

impl<T: RpcTransport> LedgerClient<T> {
    /// Create a client over an arbitrary transport.
    ///
    /// Fails only if a configured contract address or key is malformed;
    /// absent values are fine.
    pub fn new(transport: T, config: LedgerConfig) -> Result<Self> {
        let contract = config
            .contract_address
            .as_deref()
            .map(Address::from_hex)
            .transpose()?;
        let signer = config
            .private_key
            .as_deref()
            .map(Signer::from_hex)
            .transpose()?;

        let chain_id = OnceLock::new();
        if let Some(id) = config.chain_id {
            let _ = chain_id.set(id);
        }

        Ok(Self {
            transport,
            config,
            contract,
            signer,
            chain_id,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registry contract address, if configured.
    pub fn contract(&self) -> Option<Address> {
        self.contract
    }

    /// Submitting account, if a key is configured.
    pub fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(Signer::address)
    }

    /// Liveness probe. Never fails; any error means "not connected".
    pub fn is_connected(&self) -> bool {
        match self.transport.call("web3_clientVersion", json!([])) {
            Ok(version) => {
                debug!(client = %version, "ledger node reachable");
                true
            }
            Err(e) => {
                debug!(error = %e, "ledger node unreachable");
                false
            }
        }
    }

    /// Register `digest` for `id` and wait for the receipt.
    ///
    /// Returns the transaction hash only if the receipt reports success.
    /// Returns `None` when disconnected, unconfigured, already registered,
    /// reverted or on any RPC failure.
    pub fn anchor(&self, id: &str, digest: &Digest) -> Option<TxHash> {
        if !self.is_connected() {
            warn!(mrv_id = id, "not connected to ledger, skipping hash anchoring");
            return None;
        }
        let (Some(contract), Some(signer)) = (self.contract, self.signer.as_ref()) else {
            warn!(mrv_id = id, "contract or account not configured, skipping hash anchoring");
            return None;
        };

        match self.try_anchor(contract, signer, id, digest) {
            Ok(Some(tx_hash)) => {
                info!(mrv_id = id, tx_hash = %tx_hash.short(), "hash anchored on ledger");
                Some(tx_hash)
            }
            Ok(None) => {
                error!(mrv_id = id, "anchoring transaction failed");
                None
            }
            Err(e) => {
                error!(mrv_id = id, error = %e, "failed to anchor hash");
                None
            }
        }
    }

    fn try_anchor(
        &self,
        contract: Address,
        signer: &Signer,
        id: &str,
        digest: &Digest,
    ) -> Result<Option<TxHash>> {
        if self.try_is_registered(contract, id)? {
            return Err(LedgerError::AlreadyRegistered(id.to_string()));
        }

        let from = signer.address();
        let nonce = self.quantity(
            "eth_getTransactionCount",
            json!([from.to_hex(), "pending"]),
        )?;
        let gas_price = self.quantity("eth_gasPrice", json!([]))?;

        let tx = LegacyTransaction {
            nonce: u64::try_from(nonce)
                .map_err(|_| LedgerError::Protocol("nonce exceeds 64 bits".into()))?,
            gas_price,
            gas_limit: self.config.gas_limit,
            to: contract,
            value: 0,
            data: abi::encode_register_record(id, digest),
            chain_id: self.chain_id()?,
        };
        let signed = signer.sign(tx)?;

        let result = self
            .transport
            .call("eth_sendRawTransaction", json!([encode_hex(&signed.encode())]))?;
        let tx_hash = TxHash::from_hex(as_str(&result)?)?;
        debug!(mrv_id = id, tx_hash = %tx_hash, nonce = signed.tx.nonce, "transaction submitted");

        let receipt = self.wait_for_receipt(&tx_hash)?;
        let status = receipt
            .get("status")
            .and_then(Value::as_str)
            .map(parse_quantity)
            .transpose()?;

        Ok(match status {
            Some(1) => Some(tx_hash),
            _ => None,
        })
    }

    /// Poll for a receipt until the configured timeout.
    fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Value> {
        let deadline = Instant::now() + self.config.receipt_timeout;
        loop {
            let receipt = self
                .transport
                .call("eth_getTransactionReceipt", json!([tx_hash.to_hex()]))?;
            if !receipt.is_null() {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(LedgerError::Timeout(format!(
                    "no receipt for {} after {:?}",
                    tx_hash, self.config.receipt_timeout
                )));
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Look up the anchor for `id`. `None` if unregistered or on failure.
    pub fn get(&self, id: &str) -> Option<LedgerAnchor> {
        match self.try_get(id) {
            Ok(anchor) => anchor,
            Err(e) => {
                error!(mrv_id = id, error = %e, "failed to retrieve hash");
                None
            }
        }
    }

    /// Like [`get`](Self::get) but surfaces failures.
    pub fn try_get(&self, id: &str) -> Result<Option<LedgerAnchor>> {
        let contract = self.require_contract()?;
        let output = self.eth_call(contract, abi::encode_get_record(id))?;
        let tuple = abi::decode_get_record(&output)?;

        if tuple.timestamp == 0 {
            return Ok(None);
        }
        Ok(Some(LedgerAnchor {
            digest: tuple.digest,
            timestamp: tuple.timestamp,
            submitter: tuple.submitter,
        }))
    }

    /// True iff an anchor exists for `id` and its digest equals `expected`.
    pub fn verify(&self, id: &str, expected: &Digest) -> bool {
        self.get(id).map_or(false, |anchor| anchor.digest == *expected)
    }

    /// Whether the registry holds an anchor for `id`. `false` on failure.
    pub fn is_registered(&self, id: &str) -> bool {
        let result = self
            .require_contract()
            .and_then(|contract| self.try_is_registered(contract, id));
        match result {
            Ok(registered) => registered,
            Err(e) => {
                error!(mrv_id = id, error = %e, "failed to query registration");
                false
            }
        }
    }

    fn try_is_registered(&self, contract: Address, id: &str) -> Result<bool> {
        let output = self.eth_call(contract, abi::encode_is_registered(id))?;
        abi::decode_bool(&output)
    }

    fn require_contract(&self) -> Result<Address> {
        self.contract
            .ok_or_else(|| LedgerError::Config("no contract address configured".into()))
    }

    fn chain_id(&self) -> Result<u64> {
        if let Some(id) = self.chain_id.get() {
            return Ok(*id);
        }
        let id = u64::try_from(self.quantity("eth_chainId", json!([]))?)
            .map_err(|_| LedgerError::Protocol("chain id exceeds 64 bits".into()))?;
        let _ = self.chain_id.set(id);
        Ok(id)
    }

    fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let result = self.transport.call(
            "eth_call",
            json!([{ "to": to.to_hex(), "data": encode_hex(&data) }, "latest"]),
        )?;
        decode_hex(as_str(&result)?)
    }

    fn quantity(&self, method: &str, params: Value) -> Result<u128> {
        let result = self.transport.call(method, params)?;
        parse_quantity(as_str(&result)?)
    }
}

impl<T: RpcTransport> std::fmt::Debug for LedgerClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("contract", &self.contract)
            .field("account", &self.account())
            .finish()
    }
}

fn as_str(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| LedgerError::Protocol(format!("expected hex string, got {}", value)))
}
