//! Local transaction signing
//!
//! The wallet key never leaves the process. Transactions are signed here and
//! handed to the node with `eth_sendRawTransaction`.

use std::fmt;

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::error::{Result, WalletError};
use crate::model::{Address, TransactionRequest};
use crate::rlp::{encode_bytes, encode_list, encode_uint, strip_zeros};

const EIP1559_TYPE: u8 = 0x02;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    word(&Keccak256::digest(data))
}

fn word(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

/// How the transaction pays for gas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fees {
    /// Pre-London `gasPrice`, signed with EIP-155 replay protection
    Legacy { gas_price: u128 },
    /// EIP-1559 fee cap and tip
    DynamicFee {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

/// A fully specified transaction, ready to sign
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u128,
    pub fees: Fees,
    pub to: Option<Address>,
    pub value: u128,
    pub data: Vec<u8>,
}

impl Transaction {
    pub fn new(
        request: &TransactionRequest,
        chain_id: u64,
        nonce: u64,
        gas_limit: u128,
        fees: Fees,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            gas_limit,
            fees,
            to: request.to,
            value: request.value,
            data: request.data.clone(),
        }
    }

    /// Keccak-256 of the payload the signature commits to
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut fields = self.body();
        let payload = match self.fees {
            Fees::Legacy { .. } => {
                fields.extend([
                    encode_uint(self.chain_id.into()),
                    encode_uint(0),
                    encode_uint(0),
                ]);
                encode_list(&fields)
            }
            Fees::DynamicFee { .. } => typed(&fields),
        };
        keccak256(&payload)
    }

    fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let mut fields = self.body();
        let r = encode_bytes(strip_zeros(&signature.r));
        let s = encode_bytes(strip_zeros(&signature.s));
        match self.fees {
            Fees::Legacy { .. } => {
                // EIP-155: v = chainId * 2 + 35 + yParity
                let v = u128::from(self.chain_id) * 2 + 35 + u128::from(signature.y_parity);
                fields.extend([encode_uint(v), r, s]);
                encode_list(&fields)
            }
            Fees::DynamicFee { .. } => {
                fields.extend([encode_uint(signature.y_parity.into()), r, s]);
                typed(&fields)
            }
        }
    }

    /// Fields shared by the signing payload and the signed envelope
    fn body(&self) -> Vec<Vec<u8>> {
        let to = encode_bytes(self.to.as_ref().map_or(&[][..], |a| &a.as_bytes()[..]));
        match self.fees {
            Fees::Legacy { gas_price } => vec![
                encode_uint(self.nonce.into()),
                encode_uint(gas_price),
                encode_uint(self.gas_limit),
                to,
                encode_uint(self.value),
                encode_bytes(&self.data),
            ],
            Fees::DynamicFee {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => vec![
                encode_uint(self.chain_id.into()),
                encode_uint(self.nonce.into()),
                encode_uint(max_priority_fee_per_gas),
                encode_uint(max_fee_per_gas),
                encode_uint(self.gas_limit),
                to,
                encode_uint(self.value),
                encode_bytes(&self.data),
                // empty access list
                encode_list(&[]),
            ],
        }
    }
}

fn typed(fields: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![EIP1559_TYPE];
    out.extend(encode_list(fields));
    out
}

/// secp256k1 signature with the parity of the nonce point
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub y_parity: u8,
}

/// Signs with a private key held in memory
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a 32-byte hex private key, with or without `0x`
    pub fn from_hex(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        // the key itself never goes into an error message
        let bytes = hex::decode(digits)
            .map_err(|_| WalletError::Config("private key is not valid hex".into()))?;
        if bytes.len() != 32 {
            return Err(WalletError::Config(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(&bytes).map_err(|_| {
            WalletError::Config("private key is not a valid secp256k1 scalar".into())
        })?;
        Ok(Self::from_key(key))
    }

    fn from_key(key: SigningKey) -> Self {
        let address = public_address(&key);
        Self { key, address }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature> {
        let (signature, recovery) = self
            .key
            .sign_prehash_recoverable(hash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        let (r, s) = signature.split_bytes();
        Ok(RecoverableSignature {
            r: word(&r),
            s: word(&s),
            y_parity: u8::from(recovery.is_y_odd()),
        })
    }

    /// Serialized signed transaction, ready for `eth_sendRawTransaction`
    pub fn sign_transaction(&self, tx: &Transaction) -> Result<Vec<u8>> {
        let signature = self.sign_hash(&tx.signing_hash())?;
        Ok(tx.encode_signed(&signature))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Last 20 bytes of the Keccak-256 of the uncompressed public key
fn public_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().as_affine().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    use super::*;
    use crate::abi::{self, to_hex};
    use crate::rlp::{self, TxType, UnsignedTransaction};

    // EIP-155 reference transaction and key
    const KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";

    fn eip155_reference() -> Transaction {
        Transaction {
            chain_id: 1,
            nonce: 9,
            gas_limit: 21_000,
            fees: Fees::Legacy {
                gas_price: 20_000_000_000,
            },
            to: Some(Address::from_bytes([0x35; 20])),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_address_from_key() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
        );
        assert!(!format!("{signer:?}").contains("4646"));
    }

    #[test]
    fn test_legacy_signature_matches_eip155_vector() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let tx = eip155_reference();

        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        assert_eq!(
            to_hex(&signer.sign_transaction(&tx).unwrap()),
            "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a7\
             6400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a0\
             67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_eip1559_signature_recovers_signer() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let usdc = Address::from_bytes([0x83; 20]);
        let shop = Address::from_bytes([0x22; 20]);
        let request = TransactionRequest::call(usdc, abi::transfer(shop, 1_500_000));
        let tx = Transaction::new(
            &request,
            8453,
            3,
            65_000,
            Fees::DynamicFee {
                max_fee_per_gas: 2_000_000_000,
                max_priority_fee_per_gas: 1_000_000,
            },
        );

        let raw = signer.sign_transaction(&tx).unwrap();
        assert_eq!(raw[0], 0x02);

        let decoded = UnsignedTransaction::decode(&raw).unwrap();
        assert_eq!(decoded.tx_type, TxType::DynamicFee);
        assert_eq!(decoded.chain_id, Some(8453));
        assert_eq!(decoded.nonce, 3);
        assert_eq!(decoded.gas, 65_000);
        assert_eq!(decoded.request(), request);

        let rlp::Item::List(fields) = rlp::decode(&raw[1..]).unwrap() else {
            panic!("signed transaction is not a list");
        };
        assert_eq!(fields.len(), 12);
        let part = |i: usize| match &fields[i] {
            rlp::Item::Bytes(b) => b.to_vec(),
            rlp::Item::List(_) => panic!("field {i} is a list"),
        };
        let mut rs = [0u8; 64];
        let (r, s) = (part(10), part(11));
        rs[32 - r.len()..32].copy_from_slice(&r);
        rs[64 - s.len()..].copy_from_slice(&s);
        let y_odd = part(9) == [1];

        let signature = Signature::from_slice(&rs).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(
            &tx.signing_hash(),
            &signature,
            RecoveryId::new(y_odd, false),
        )
        .unwrap();
        assert_eq!(&recovered, signer.key.verifying_key());
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!(matches!(
            LocalSigner::from_hex("0x1234"),
            Err(WalletError::Config(_))
        ));
        assert!(matches!(
            LocalSigner::from_hex("zz"),
            Err(WalletError::Config(_))
        ));
        let zero = format!("0x{}", "00".repeat(32));
        assert!(LocalSigner::from_hex(&zero).is_err());
    }
}
