//! RLP encoding and decoding of serialized transactions
//!
//! Checkout APIs hand back a prepared payment as a hex-encoded unsigned
//! transaction. The wallet only needs `{to, value, data}` from it; nonce and
//! fees are read again from the node when the transaction is signed.

use crate::abi::from_hex;
use crate::error::{Result, WalletError};
use crate::model::{Address, TransactionRequest};

/// One decoded RLP item, borrowing from the input
#[derive(Debug, PartialEq, Eq)]
pub enum Item<'a> {
    Bytes(&'a [u8]),
    List(Vec<Item<'a>>),
}

impl<'a> Item<'a> {
    fn bytes(&self) -> Result<&'a [u8]> {
        match self {
            Self::Bytes(b) => Ok(b),
            Self::List(_) => Err(WalletError::Decode("expected bytes, found list".into())),
        }
    }

    fn uint(&self) -> Result<u128> {
        let bytes = self.bytes()?;
        if bytes.len() > 16 {
            return Err(WalletError::Decode("integer exceeds 128 bits".into()));
        }
        Ok(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
    }
}

/// Deepest list nesting accepted. Typed transactions nest at most four levels
/// (transaction, access list, entry, storage keys).
pub const MAX_DEPTH: usize = 16;

/// Encode a byte string
pub fn encode_bytes(payload: &[u8]) -> Vec<u8> {
    if let [b @ 0x00..=0x7f] = payload {
        return vec![*b];
    }
    let mut out = length_prefix(0x80, payload.len());
    out.extend_from_slice(payload);
    out
}

/// Encode an unsigned integer as its minimal big-endian bytes
pub fn encode_uint(value: u128) -> Vec<u8> {
    let raw = value.to_be_bytes();
    encode_bytes(strip_zeros(&raw))
}

/// Encode a list of already encoded items
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload = items.concat();
    let mut out = length_prefix(0xc0, payload.len());
    out.extend(payload);
    out
}

/// Big-endian integer bytes without leading zeros
pub fn strip_zeros(raw: &[u8]) -> &[u8] {
    let start = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
    &raw[start..]
}

#[allow(clippy::cast_possible_truncation)]
fn length_prefix(offset: u8, len: usize) -> Vec<u8> {
    if len <= 55 {
        return vec![offset + len as u8];
    }
    let raw = len.to_be_bytes();
    let digits = strip_zeros(&raw);
    // a usize has at most 8 length bytes
    let mut out = vec![offset + 55 + digits.len() as u8];
    out.extend_from_slice(digits);
    out
}

/// Decode exactly one item spanning the whole input
pub fn decode(input: &[u8]) -> Result<Item<'_>> {
    let (item, rest) = decode_item(input, 0)?;
    if !rest.is_empty() {
        return Err(WalletError::Decode(format!(
            "{} trailing bytes after RLP item",
            rest.len()
        )));
    }
    Ok(item)
}

fn decode_item(input: &[u8], depth: usize) -> Result<(Item<'_>, &[u8])> {
    let (&prefix, tail) = input
        .split_first()
        .ok_or_else(|| WalletError::Decode("unexpected end of RLP input".into()))?;

    match prefix {
        0x00..=0x7f => Ok((Item::Bytes(&input[..1]), tail)),
        0x80..=0xb7 => {
            let (payload, rest) = take(tail, usize::from(prefix - 0x80))?;
            Ok((Item::Bytes(payload), rest))
        }
        0xb8..=0xbf => {
            let (len, tail) = long_length(tail, usize::from(prefix - 0xb7))?;
            let (payload, rest) = take(tail, len)?;
            Ok((Item::Bytes(payload), rest))
        }
        0xc0..=0xf7 => {
            let (payload, rest) = take(tail, usize::from(prefix - 0xc0))?;
            Ok((Item::List(decode_list(payload, depth + 1)?), rest))
        }
        0xf8..=0xff => {
            let (len, tail) = long_length(tail, usize::from(prefix - 0xf7))?;
            let (payload, rest) = take(tail, len)?;
            Ok((Item::List(decode_list(payload, depth + 1)?), rest))
        }
    }
}

fn decode_list(mut payload: &[u8], depth: usize) -> Result<Vec<Item<'_>>> {
    if depth > MAX_DEPTH {
        return Err(WalletError::Decode(format!(
            "RLP lists nested deeper than {MAX_DEPTH}"
        )));
    }
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = decode_item(payload, depth)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

fn take(input: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if input.len() < len {
        return Err(WalletError::Decode(format!(
            "RLP item needs {len} bytes, {} left",
            input.len()
        )));
    }
    Ok(input.split_at(len))
}

fn long_length(input: &[u8], len_of_len: usize) -> Result<(usize, &[u8])> {
    let (raw, rest) = take(input, len_of_len)?;
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(WalletError::Decode("RLP length too large".into()));
    }
    let len = raw.iter().fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    Ok((len, rest))
}

/// Envelope of a serialized transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxType {
    Legacy,
    AccessList,
    DynamicFee,
}

/// Fields of an unsigned transaction the wallet cares about
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub tx_type: TxType,
    pub chain_id: Option<u64>,
    pub nonce: u128,
    pub gas: u128,
    pub to: Option<Address>,
    pub value: u128,
    pub data: Vec<u8>,
}

impl UnsignedTransaction {
    /// Parse a `0x`-prefixed serialized transaction (legacy, EIP-2930 or EIP-1559)
    pub fn parse(serialized: &str) -> Result<Self> {
        let raw = from_hex(serialized.trim())?;
        Self::decode(&raw)
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        match raw.first() {
            Some(0x02) => Self::from_fields(TxType::DynamicFee, &list(&raw[1..])?),
            Some(0x01) => Self::from_fields(TxType::AccessList, &list(&raw[1..])?),
            Some(b) if *b >= 0xc0 => Self::from_fields(TxType::Legacy, &list(raw)?),
            Some(b) => Err(WalletError::Decode(format!(
                "unsupported transaction type 0x{b:02x}"
            ))),
            None => Err(WalletError::Decode("empty transaction".into())),
        }
    }

    fn from_fields(tx_type: TxType, fields: &[Item<'_>]) -> Result<Self> {
        // index of `to`; fields before it are type specific
        let (to_index, min_len) = match tx_type {
            TxType::Legacy => (3, 6),
            TxType::AccessList => (4, 8),
            TxType::DynamicFee => (5, 9),
        };
        if fields.len() < min_len {
            return Err(WalletError::Decode(format!(
                "{tx_type:?} transaction has {} fields",
                fields.len()
            )));
        }

        let chain_id = match tx_type {
            TxType::Legacy => legacy_chain_id(fields)?,
            _ => Some(to_u64(fields[0].uint()?)?),
        };
        let nonce = match tx_type {
            TxType::Legacy => fields[0].uint()?,
            _ => fields[1].uint()?,
        };

        let to = match fields[to_index].bytes()? {
            [] => None,
            bytes => Some(Address::from_slice(bytes)?),
        };

        Ok(Self {
            tx_type,
            chain_id,
            nonce,
            gas: fields[to_index - 1].uint()?,
            to,
            value: fields[to_index + 1].uint()?,
            data: fields[to_index + 2].bytes()?.to_vec(),
        })
    }

    /// Request the wallet submits for this transaction
    pub fn request(&self) -> TransactionRequest {
        TransactionRequest {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
        }
    }
}

fn list(raw: &[u8]) -> Result<Vec<Item<'_>>> {
    match decode(raw)? {
        Item::List(items) => Ok(items),
        Item::Bytes(_) => Err(WalletError::Decode("transaction is not an RLP list".into())),
    }
}

/// EIP-155 unsigned legacy transactions carry `[chainId, 0, 0]` as `v, r, s`
fn legacy_chain_id(fields: &[Item<'_>]) -> Result<Option<u64>> {
    if fields.len() < 9 || fields[7].uint()? != 0 || fields[8].uint()? != 0 {
        return Ok(None);
    }
    to_u64(fields[6].uint()?).map(Some)
}

fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| WalletError::Decode(format!("chain id {value} too large")))
}
