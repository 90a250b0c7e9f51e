//! Legacy (EIP-155) transactions: building, signing, decoding and sender
//! recovery.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use crate::error::{LedgerError, Result};
use crate::eth::{keccak256, strip_0x, Address, TxHash};
use crate::rlp::{self, Item};

/// An unsigned legacy transaction with replay protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn fields(&self) -> Vec<Item> {
        vec![
            Item::uint(u128::from(self.nonce)),
            Item::uint(self.gas_price),
            Item::uint(u128::from(self.gas_limit)),
            Item::bytes(self.to.as_bytes().to_vec()),
            Item::uint(self.value),
            Item::bytes(self.data.clone()),
        ]
    }

    /// RLP payload that gets signed:
    /// `[nonce, gasPrice, gas, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = self.fields();
        fields.push(Item::uint(u128::from(self.chain_id)));
        fields.push(Item::uint(0));
        fields.push(Item::uint(0));
        rlp::encode(&Item::List(fields))
    }

    /// Keccak-256 of the signing payload.
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    fn encode_signed(&self, v: u64, r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut fields = self.fields();
        fields.push(Item::uint(u128::from(v)));
        fields.push(Item::uint_bytes(r));
        fields.push(Item::uint_bytes(s));
        rlp::encode(&Item::List(fields))
    }
}

/// A signed transaction as it travels over `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: LegacyTransaction,
    pub v: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignedTransaction {
    /// Decode raw transaction bytes. Only EIP-155 protected transactions
    /// are accepted.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let item = rlp::decode(raw)?;
        let fields = item.as_list()?;
        if fields.len() != 9 {
            return Err(LedgerError::Rlp(format!(
                "legacy transaction has 9 fields, got {}",
                fields.len()
            )));
        }

        let to_bytes = fields[3].as_bytes()?;
        let to: [u8; 20] = to_bytes
            .try_into()
            .map_err(|_| LedgerError::Rlp("contract creation is not supported".into()))?;

        let v = fields[6].as_u64()?;
        if v < 35 {
            return Err(LedgerError::Signing("transaction lacks replay protection".into()));
        }

        Ok(Self {
            tx: LegacyTransaction {
                nonce: fields[0].as_u64()?,
                gas_price: fields[1].as_uint()?,
                gas_limit: fields[2].as_u64()?,
                to: Address(to),
                value: fields[4].as_uint()?,
                data: fields[5].as_bytes()?.to_vec(),
                chain_id: (v - 35) / 2,
            },
            v,
            r: left_pad(fields[7].as_bytes()?)?,
            s: left_pad(fields[8].as_bytes()?)?,
        })
    }

    /// Raw RLP bytes.
    pub fn encode(&self) -> Vec<u8> {
        self.tx.encode_signed(self.v, &self.r, &self.s)
    }

    pub fn hash(&self) -> TxHash {
        TxHash::of_raw(&self.encode())
    }

    /// Recover the signer's address from the signature.
    pub fn recover_sender(&self) -> Result<Address> {
        let recid = u8::try_from((self.v - 35) % 2)
            .ok()
            .and_then(RecoveryId::from_byte)
            .ok_or_else(|| LedgerError::Signing("invalid recovery id".into()))?;

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature =
            Signature::from_slice(&rs).map_err(|e| LedgerError::Signing(e.to_string()))?;
        if signature.normalize_s().is_some() {
            return Err(LedgerError::Signing("signature s value is not low".into()));
        }

        let key =
            VerifyingKey::recover_from_prehash(&self.tx.signing_hash(), &signature, recid)
                .map_err(|e| LedgerError::Signing(e.to_string()))?;
        address_of(&key)
    }
}

fn left_pad(bytes: &[u8]) -> Result<[u8; 32]> {
    if bytes.len() > 32 {
        return Err(LedgerError::Rlp("signature scalar exceeds 32 bytes".into()));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

fn address_of(key: &VerifyingKey) -> Result<Address> {
    Address::from_uncompressed_key(key.to_encoded_point(false).as_bytes())
}

/// A secp256k1 account key.
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
    address: Address,
}

impl Signer {
    /// Parse a 32-byte hex private key, `0x` optional.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_0x(s.trim()))
            .map_err(|_| LedgerError::Config("private key is not valid hex".into()))?;
        if bytes.len() != 32 {
            return Err(LedgerError::Config("private key must be 32 bytes".into()));
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| LedgerError::Config("private key is out of range".into()))?;
        Self::from_key(key)
    }

    fn from_key(key: SigningKey) -> Result<Self> {
        let address = address_of(key.verifying_key())?;
        Ok(Self { key, address })
    }

    /// The account this key controls.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign with a low-S recoverable signature and EIP-155 `v`.
    pub fn sign(&self, tx: LegacyTransaction) -> Result<SignedTransaction> {
        let hash = tx.signing_hash();
        let (mut signature, mut recid) = self
            .key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| LedgerError::Signing(e.to_string()))?;

        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recid = RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced());
        }

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        let v = u64::from(recid.to_byte()) + tx.chain_id * 2 + 35;
        Ok(SignedTransaction { tx, v, r, s })
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    /// The example transaction from EIP-155.
    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Address([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn test_eip155_signing_payload() {
        let tx = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_known_address() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_sign_decode_recover() {
        let signer = Signer::from_hex(&"46".repeat(32)).unwrap();
        let signed = signer.sign(eip155_example()).unwrap();
        assert!(signed.v == 37 || signed.v == 38);

        let decoded = SignedTransaction::decode(&signed.encode()).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(decoded.tx.chain_id, 1);
        assert_eq!(decoded.recover_sender().unwrap(), signer.address());
    }

    #[test]
    fn test_eip155_known_answer() {
        let signer = Signer::from_hex(&"46".repeat(32)).unwrap();
        let signed = signer.sign(eip155_example()).unwrap();

        assert_eq!(signed.v, 37);
        assert_eq!(
            hex::encode(signed.r),
            "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
        );
        assert_eq!(
            hex::encode(signed.s),
            "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(
            hex::encode(signed.encode()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(
            signed.hash().to_hex(),
            "0x33469b22e9f636356c4160a87eb19df52b7412e8eac32a4a55ffe88ea8350788"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        let a = signer.sign(eip155_example()).unwrap();
        let b = signer.sign(eip155_example()).unwrap();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_tampered_transaction_recovers_other_sender() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        let mut signed = signer.sign(eip155_example()).unwrap();
        signed.tx.nonce += 1;
        if let Ok(addr) = signed.recover_sender() {
            assert_ne!(addr, signer.address());
        }
    }

    #[test]
    fn test_bad_keys_rejected() {
        assert!(Signer::from_hex("xyz").is_err());
        assert!(Signer::from_hex("0x01").is_err());
        assert!(Signer::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        let printed = format!("{:?}", signer);
        assert!(printed.contains("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"));
        assert!(!printed.contains("0000000000000001"));
    }
}
