//! JSON-RPC transport abstraction.
//!
//! The ledger client only needs request/response calls. Implementations
//! may use HTTP or run a node in-process (see [`crate::memory`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::trace;

use crate::error::{LedgerError, Result};

/// Transport trait for JSON-RPC calls.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait RpcTransport: Send + Sync {
    /// Invoke `method` with positional `params` and return the `result`
    /// member of the response.
    ///
    /// A JSON-RPC error object maps to [`LedgerError::Rpc`]; failing to
    /// reach the node maps to [`LedgerError::Transport`].
    fn call(&self, method: &str, params: Value) -> Result<Value>;
}

impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        (**self).call(method, params)
    }
}

impl<T: RpcTransport + ?Sized> RpcTransport for &T {
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        (**self).call(method, params)
    }
}

/// JSON-RPC 2.0 over HTTP POST.
#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for HttpTransport {
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(method, id, "rpc request");

        let response: Value = self
            .client
            .post(&self.url)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        unwrap_response(response)
    }
}

/// Extract `result` from a JSON-RPC response envelope.
pub fn unwrap_response(mut response: Value) -> Result<Value> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(LedgerError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    match response.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(LedgerError::Protocol("response has neither result nor error".into())),
    }
}
