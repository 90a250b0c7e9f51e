//! Contract ABI for the record registry.
//!
//! The registry exposes three functions and one event:
//!
//! ```text
//! function registerRecord(string id, bytes32 digest)
//! function getRecord(string id) view returns (bytes32, uint256, address)
//! function isRegistered(string id) view returns (bool)
//! event RecordRegistered(string indexed id, bytes32 digest, uint256 timestamp, address indexed submitter)
//! ```
//!
//! Encoding follows the Solidity ABI: 4-byte Keccak selector, 32-byte head
//! words, dynamic strings as offset + length + zero-padded data.

use mrv_core::Digest;

use crate::error::{LedgerError, Result};
use crate::eth::{keccak256, Address};

pub const REGISTER_RECORD: &str = "registerRecord(string,bytes32)";
pub const GET_RECORD: &str = "getRecord(string)";
pub const IS_REGISTERED: &str = "isRegistered(string)";
pub const RECORD_REGISTERED: &str = "RecordRegistered(string,bytes32,uint256,address)";

const WORD: usize = 32;

/// First four bytes of the Keccak hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Topic 0 of the `RecordRegistered` event.
pub fn record_registered_topic() -> [u8; 32] {
    keccak256(RECORD_REGISTERED.as_bytes())
}

fn word_from_u64(n: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&n.to_be_bytes());
    word
}

/// Left-pad an address into a word.
pub fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 20..].copy_from_slice(address.as_bytes());
    word
}

fn encode_string_tail(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&word_from_u64(bytes.len() as u64));
    buf.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    buf.extend(std::iter::repeat(0u8).take(padding));
}

/// Call data for `registerRecord(id, digest)`.
pub fn encode_register_record(id: &str, digest: &Digest) -> Vec<u8> {
    let mut buf = selector(REGISTER_RECORD).to_vec();
    // Two head words: string offset, then the static bytes32.
    buf.extend_from_slice(&word_from_u64((2 * WORD) as u64));
    buf.extend_from_slice(digest.as_bytes());
    encode_string_tail(&mut buf, id);
    buf
}

fn encode_single_string_call(signature: &str, id: &str) -> Vec<u8> {
    let mut buf = selector(signature).to_vec();
    buf.extend_from_slice(&word_from_u64(WORD as u64));
    encode_string_tail(&mut buf, id);
    buf
}

/// Call data for `getRecord(id)`.
pub fn encode_get_record(id: &str) -> Vec<u8> {
    encode_single_string_call(GET_RECORD, id)
}

/// Call data for `isRegistered(id)`.
pub fn encode_is_registered(id: &str) -> Vec<u8> {
    encode_single_string_call(IS_REGISTERED, id)
}

fn word(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * WORD;
    data.get(start..start + WORD)
        .ok_or_else(|| LedgerError::Abi(format!("missing word {}", index)))
}

/// Read a word as a u64, rejecting values that do not fit.
fn word_as_u64(data: &[u8], index: usize) -> Result<u64> {
    let w = word(data, index)?;
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(LedgerError::Abi(format!("word {} exceeds 64 bits", index)));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&w[WORD - 8..]);
    Ok(u64::from_be_bytes(tail))
}

fn word_as_usize(data: &[u8], index: usize) -> Result<usize> {
    usize::try_from(word_as_u64(data, index)?)
        .map_err(|_| LedgerError::Abi("offset exceeds address space".into()))
}

/// Decode a dynamic string whose offset sits in head word `index`.
fn decode_string(args: &[u8], index: usize) -> Result<String> {
    let offset = word_as_usize(args, index)?;
    let tail = args
        .get(offset..)
        .ok_or_else(|| LedgerError::Abi("string offset out of range".into()))?;
    let len = word_as_usize(tail, 0)?;
    let end = WORD
        .checked_add(len)
        .ok_or_else(|| LedgerError::Abi("string length overflows".into()))?;
    let bytes = tail
        .get(WORD..end)
        .ok_or_else(|| LedgerError::Abi("string data truncated".into()))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| LedgerError::Abi(e.to_string()))
}

/// Decoded return of `getRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTuple {
    pub digest: Digest,
    pub timestamp: u64,
    pub submitter: Address,
}

/// Decode the `(bytes32, uint256, address)` return of `getRecord`.
pub fn decode_get_record(output: &[u8]) -> Result<RecordTuple> {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(word(output, 0)?);
    let timestamp = word_as_u64(output, 1)?;

    let address_word = word(output, 2)?;
    if address_word[..WORD - 20].iter().any(|b| *b != 0) {
        return Err(LedgerError::Abi("address word has dirty high bytes".into()));
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&address_word[WORD - 20..]);

    Ok(RecordTuple {
        digest: Digest::from_bytes(digest),
        timestamp,
        submitter: Address(address),
    })
}

/// Encode a `getRecord` return value.
pub fn encode_get_record_output(tuple: &RecordTuple) -> Vec<u8> {
    let mut buf = Vec::with_capacity(3 * WORD);
    buf.extend_from_slice(tuple.digest.as_bytes());
    buf.extend_from_slice(&word_from_u64(tuple.timestamp));
    buf.extend_from_slice(&address_word(&tuple.submitter));
    buf
}

/// Decode a `bool` return value.
pub fn decode_bool(output: &[u8]) -> Result<bool> {
    match word_as_u64(output, 0)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LedgerError::Abi(format!("invalid bool {}", other))),
    }
}

pub fn encode_bool(value: bool) -> Vec<u8> {
    word_from_u64(u64::from(value)).to_vec()
}

/// Encode the non-indexed `RecordRegistered` data: digest and timestamp.
pub fn encode_record_registered_data(digest: &Digest, timestamp: u64) -> Vec<u8> {
    let mut buf = digest.as_bytes().to_vec();
    buf.extend_from_slice(&word_from_u64(timestamp));
    buf
}

/// A decoded registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    RegisterRecord { id: String, digest: Digest },
    GetRecord { id: String },
    IsRegistered { id: String },
}

/// Decode call data addressed to the registry.
pub fn decode_call(data: &[u8]) -> Result<RegistryCall> {
    if data.len() < 4 {
        return Err(LedgerError::Abi("call data shorter than a selector".into()));
    }
    let (sel, args) = data.split_at(4);

    if sel == selector(REGISTER_RECORD) {
        let id = decode_string(args, 0)?;
        let mut digest = [0u8; 32];
        digest.copy_from_slice(word(args, 1)?);
        Ok(RegistryCall::RegisterRecord {
            id,
            digest: Digest::from_bytes(digest),
        })
    } else if sel == selector(GET_RECORD) {
        Ok(RegistryCall::GetRecord {
            id: decode_string(args, 0)?,
        })
    } else if sel == selector(IS_REGISTERED) {
        Ok(RegistryCall::IsRegistered {
            id: decode_string(args, 0)?,
        })
    } else {
        Err(LedgerError::Abi(format!("unknown selector 0x{}", hex::encode(sel))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selector() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_register_record_layout() {
        let digest = Digest::from_bytes([0x11; 32]);
        let data = encode_register_record("MRV-abc", &digest);

        assert_eq!(&data[..4], &selector(REGISTER_RECORD));
        // selector + offset + digest + length + one padded word
        assert_eq!(data.len(), 4 + 4 * 32);
        assert_eq!(data[4 + 31], 0x40);
        assert_eq!(&data[36..68], &[0x11; 32]);
        assert_eq!(data[68 + 31], 7);
        assert_eq!(&data[100..107], b"MRV-abc");
        assert!(data[107..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_string_padding_exact_word() {
        let id = "x".repeat(32);
        let data = encode_get_record(&id);
        assert_eq!(data.len(), 4 + 32 + 32 + 32);
    }

    #[test]
    fn test_decode_call_roundtrip() {
        let digest = Digest::from_bytes([0x42; 32]);
        let id = "MRV-5a0c6f7e-1111-4222-8333-944445555666";

        assert_eq!(
            decode_call(&encode_register_record(id, &digest)).unwrap(),
            RegistryCall::RegisterRecord { id: id.into(), digest }
        );
        assert_eq!(
            decode_call(&encode_get_record(id)).unwrap(),
            RegistryCall::GetRecord { id: id.into() }
        );
        assert_eq!(
            decode_call(&encode_is_registered(id)).unwrap(),
            RegistryCall::IsRegistered { id: id.into() }
        );
    }

    #[test]
    fn test_decode_call_rejects_unknown_selector() {
        assert!(decode_call(&[0xde, 0xad, 0xbe, 0xef]).is_err());
        assert!(decode_call(&[0x01]).is_err());
    }

    #[test]
    fn test_decode_call_rejects_huge_string_length() {
        let mut data = encode_get_record("MRV-abc");
        // Length word sits right after selector and offset.
        data[4 + 32 + 24..4 + 64].copy_from_slice(&[0xff; 8]);
        assert!(decode_call(&data).is_err());

        data[4 + 32 + 24..4 + 64].copy_from_slice(&1024u64.to_be_bytes());
        assert!(decode_call(&data).is_err());
    }

    #[test]
    fn test_get_record_output() {
        let tuple = RecordTuple {
            digest: Digest::from_bytes([0x07; 32]),
            timestamp: 1_700_000_000,
            submitter: Address([0x99; 20]),
        };
        let out = encode_get_record_output(&tuple);
        assert_eq!(out.len(), 96);
        assert_eq!(decode_get_record(&out).unwrap(), tuple);
    }

    #[test]
    fn test_unregistered_tuple_is_all_zero() {
        let tuple = decode_get_record(&[0u8; 96]).unwrap();
        assert_eq!(tuple.timestamp, 0);
        assert_eq!(tuple.submitter, Address::ZERO);
    }

    #[test]
    fn test_decode_rejects_short_output() {
        assert!(decode_get_record(&[0u8; 64]).is_err());
        assert!(decode_bool(&[]).is_err());
        assert!(decode_bool(&encode_bool(true)).unwrap());
        assert!(!decode_bool(&encode_bool(false)).unwrap());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_id_survives_call_encoding(id in "\\PC{0,80}", bytes in any::<[u8; 32]>()) {
                let digest = Digest::from_bytes(bytes);
                let data = encode_register_record(&id, &digest);
                prop_assert_eq!((data.len() - 4) % 32, 0);
                prop_assert_eq!(
                    decode_call(&data).unwrap(),
                    RegistryCall::RegisterRecord { id, digest }
                );
            }
        }
    }
}
