//! Ledger connection settings.

use std::fmt;
use std::time::Duration;

/// Environment variable holding the node's JSON-RPC endpoint.
pub const ENV_RPC_URL: &str = "BLOCKCHAIN_RPC_URL";
/// Environment variable holding the registry contract address.
pub const ENV_CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
/// Environment variable holding the hex-encoded signing key.
pub const ENV_PRIVATE_KEY: &str = "PRIVATE_KEY";

/// Default local development node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
/// Gas limit attached to every registration.
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

/// Configuration for a [`crate::LedgerClient`].
///
/// Contract address and key are optional: without them the client can still
/// probe the node but anchoring becomes a no-op.
#[derive(Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Registry contract address (hex, `0x` optional).
    pub contract_address: Option<String>,
    /// secp256k1 signing key (hex, `0x` optional).
    pub private_key: Option<String>,
    /// EIP-155 chain id. Discovered with `eth_chainId` when unset.
    pub chain_id: Option<u64>,
    /// Gas limit for registration transactions.
    pub gas_limit: u64,
    /// How long to wait for a transaction receipt.
    pub receipt_timeout: Duration,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: None,
            private_key: None,
            chain_id: None,
            gas_limit: DEFAULT_GAS_LIMIT,
            receipt_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl LedgerConfig {
    /// Build a config from `BLOCKCHAIN_RPC_URL`, `CONTRACT_ADDRESS` and
    /// `PRIVATE_KEY`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Empty values count
    /// as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(url) = get(ENV_RPC_URL) {
            config.rpc_url = url;
        }
        config.contract_address = get(ENV_CONTRACT_ADDRESS);
        config.private_key = get(ENV_PRIVATE_KEY);
        config
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = Some(address.into());
        self
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_id", &self.chain_id)
            .field("gas_limit", &self.gas_limit)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.gas_limit, 200_000);
        assert!(config.contract_address.is_none());
        assert!(config.private_key.is_none());
        assert!(config.chain_id.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (ENV_RPC_URL, "http://node:8545"),
            (ENV_CONTRACT_ADDRESS, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            (ENV_PRIVATE_KEY, "0x01"),
        ]));
        assert_eq!(config.rpc_url, "http://node:8545");
        assert!(config.contract_address.is_some());
        assert_eq!(config.private_key.as_deref(), Some("0x01"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (ENV_RPC_URL, ""),
            (ENV_CONTRACT_ADDRESS, "  "),
        ]));
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert!(config.contract_address.is_none());
    }

    #[test]
    fn test_overrides_win() {
        let config = LedgerConfig::from_lookup(lookup(&[(ENV_RPC_URL, "http://env:1")]))
            .with_rpc_url("http://override:2")
            .with_chain_id(31337);
        assert_eq!(config.rpc_url, "http://override:2");
        assert_eq!(config.chain_id, Some(31337));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = LedgerConfig::default().with_private_key("deadbeef");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("deadbeef"));
        assert!(printed.contains("<redacted>"));
    }
}
