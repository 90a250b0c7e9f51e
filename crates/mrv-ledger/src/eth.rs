//! Ethereum primitives: Keccak-256, addresses, transaction hashes and
//! JSON-RPC quantities.

use std::fmt;
use std::str::FromStr;

use sha3::{Digest as _, Keccak256};

use crate::error::{LedgerError, Result};

/// Keccak-256 (the pre-standard SHA-3 variant Ethereum uses).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode `0x`-prefixed (or bare) hex into bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s)).map_err(|e| LedgerError::Protocol(format!("bad hex {:?}: {}", s, e)))
}

/// Encode bytes as `0x`-prefixed lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Render an integer as a JSON-RPC quantity (`0x` + minimal hex).
pub fn to_quantity(n: u128) -> String {
    format!("0x{:x}", n)
}

/// Parse a JSON-RPC quantity.
pub fn parse_quantity(s: &str) -> Result<u128> {
    let digits = strip_0x(s);
    if digits.is_empty() {
        return Err(LedgerError::Protocol(format!("empty quantity {:?}", s)));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Protocol(format!("bad quantity {:?}: {}", s, e)))
}

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse 40 hex digits, `0x` optional. Checksum casing is not enforced.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_0x(s))
            .map_err(|e| LedgerError::Config(format!("invalid address {:?}: {}", s, e)))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| LedgerError::Config(format!("address must be 20 bytes: {:?}", s)))?;
        Ok(Self(arr))
    }

    /// Address of an uncompressed SEC1 public key (`0x04 || X || Y`).
    pub fn from_uncompressed_key(point: &[u8]) -> Result<Self> {
        if point.len() != 65 || point[0] != 0x04 {
            return Err(LedgerError::Signing("expected uncompressed public key".into()));
        }
        let hash = keccak256(&point[1..]);
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&hash[12..]);
        Ok(Self(arr))
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Lowercase `0x`-prefixed hex, as JSON-RPC expects.
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Hash of a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Hash of raw signed transaction bytes.
    pub fn of_raw(raw: &[u8]) -> Self {
        Self(keccak256(raw))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LedgerError::Protocol(format!("tx hash must be 32 bytes: {:?}", s)))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    /// `0x1234abcd...abcdef`, for status lines.
    pub fn short(&self) -> String {
        let full = self.to_hex();
        format!("{}...{}", &full[..10], &full[full.len() - 6..])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.short())
    }
}

impl FromStr for TxHash {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
