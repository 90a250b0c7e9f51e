//! Recursive Length Prefix encoding for transactions.
//!
//! Only what legacy transactions need: byte strings, lists and unsigned
//! integers in minimal big-endian form. The decoder rejects non-canonical
//! length prefixes and trailing bytes.

use crate::error::{LedgerError, Result};

/// A decoded RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Bytes(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    /// Item for an unsigned integer.
    pub fn uint(n: u128) -> Self {
        Item::Bytes(trim_leading_zeros(&n.to_be_bytes()).to_vec())
    }

    /// Item for a big-endian integer given as raw bytes (e.g. signature
    /// scalars).
    pub fn uint_bytes(bytes: &[u8]) -> Self {
        Item::Bytes(trim_leading_zeros(bytes).to_vec())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Item::Bytes(bytes.into())
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Item::Bytes(b) => Ok(b),
            Item::List(_) => Err(LedgerError::Rlp("expected string, found list".into())),
        }
    }

    pub fn as_list(&self) -> Result<&[Item]> {
        match self {
            Item::List(items) => Ok(items),
            Item::Bytes(_) => Err(LedgerError::Rlp("expected list, found string".into())),
        }
    }

    /// Interpret as a minimal big-endian unsigned integer.
    pub fn as_uint(&self) -> Result<u128> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 16 {
            return Err(LedgerError::Rlp("integer exceeds 128 bits".into()));
        }
        if bytes.first() == Some(&0) {
            return Err(LedgerError::Rlp("integer has leading zero".into()));
        }
        Ok(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
    }

    pub fn as_u64(&self) -> Result<u64> {
        u64::try_from(self.as_uint()?).map_err(|_| LedgerError::Rlp("integer exceeds 64 bits".into()))
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Encode an item to bytes.
pub fn encode(item: &Item) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_to(&mut buf, item);
    buf
}

fn encode_to(buf: &mut Vec<u8>, item: &Item) {
    match item {
        Item::Bytes(b) if b.len() == 1 && b[0] < 0x80 => buf.push(b[0]),
        Item::Bytes(b) => {
            encode_length(buf, b.len(), 0x80);
            buf.extend_from_slice(b);
        }
        Item::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode_to(&mut payload, item);
            }
            encode_length(buf, payload.len(), 0xc0);
            buf.extend_from_slice(&payload);
        }
    }
}

/// Short form for payloads up to 55 bytes, long form otherwise.
fn encode_length(buf: &mut Vec<u8>, len: usize, offset: u8) {
    if len <= 55 {
        buf.push(offset + len as u8);
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let len_bytes = trim_leading_zeros(&len_bytes);
        buf.push(offset + 55 + len_bytes.len() as u8);
        buf.extend_from_slice(len_bytes);
    }
}

/// Decode exactly one item spanning all of `data`.
pub fn decode(data: &[u8]) -> Result<Item> {
    let (item, rest) = decode_item(data)?;
    if !rest.is_empty() {
        return Err(LedgerError::Rlp(format!("{} trailing bytes", rest.len())));
    }
    Ok(item)
}

fn decode_item(data: &[u8]) -> Result<(Item, &[u8])> {
    let prefix = *data
        .first()
        .ok_or_else(|| LedgerError::Rlp("unexpected end of input".into()))?;

    match prefix {
        0x00..=0x7f => Ok((Item::Bytes(vec![prefix]), &data[1..])),
        0x80..=0xb7 => {
            let len = usize::from(prefix - 0x80);
            let (payload, rest) = split(&data[1..], len)?;
            if len == 1 && payload[0] < 0x80 {
                return Err(LedgerError::Rlp("single byte should be encoded bare".into()));
            }
            Ok((Item::Bytes(payload.to_vec()), rest))
        }
        0xb8..=0xbf => {
            let (len, body) = read_long_length(&data[1..], usize::from(prefix - 0xb7))?;
            let (payload, rest) = split(body, len)?;
            Ok((Item::Bytes(payload.to_vec()), rest))
        }
        0xc0..=0xf7 => {
            let len = usize::from(prefix - 0xc0);
            let (payload, rest) = split(&data[1..], len)?;
            Ok((Item::List(decode_list(payload)?), rest))
        }
        0xf8..=0xff => {
            let (len, body) = read_long_length(&data[1..], usize::from(prefix - 0xf7))?;
            let (payload, rest) = split(body, len)?;
            Ok((Item::List(decode_list(payload)?), rest))
        }
    }
}

fn decode_list(mut payload: &[u8]) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = decode_item(payload)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

fn read_long_length(data: &[u8], len_of_len: usize) -> Result<(usize, &[u8])> {
    let (len_bytes, rest) = split(data, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(LedgerError::Rlp("length has leading zero".into()));
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(LedgerError::Rlp("length overflows".into()));
    }
    let len = len_bytes.iter().fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    if len <= 55 {
        return Err(LedgerError::Rlp("long form used for short payload".into()));
    }
    Ok((len, rest))
}

fn split(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if data.len() < len {
        return Err(LedgerError::Rlp(format!(
            "need {} bytes, have {}",
            len,
            data.len()
        )));
    }
    Ok(data.split_at(len))
}
