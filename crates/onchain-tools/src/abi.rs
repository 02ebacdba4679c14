//! Minimal ERC-20 ABI encoding
//!
//! Only the handful of static-argument calls the tools need: every argument
//! is a single 32-byte word.

use crate::error::{Result, WalletError};
use crate::model::Address;

pub type Word = [u8; 32];
pub type Selector = [u8; 4];

pub const BALANCE_OF: Selector = [0x70, 0xa0, 0x82, 0x31];
pub const TRANSFER: Selector = [0xa9, 0x05, 0x9c, 0xbb];
pub const APPROVE: Selector = [0x09, 0x5e, 0xa7, 0xb3];
pub const ALLOWANCE: Selector = [0xdd, 0x62, 0xed, 0x3e];
pub const DECIMALS: Selector = [0x31, 0x3c, 0xe5, 0x67];

pub fn address_word(address: Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn uint_word(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Selector followed by the encoded argument words
pub fn encode_call(selector: Selector, args: &[Word]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

pub fn balance_of(owner: Address) -> Vec<u8> {
    encode_call(BALANCE_OF, &[address_word(owner)])
}

pub fn transfer(to: Address, amount: u128) -> Vec<u8> {
    encode_call(TRANSFER, &[address_word(to), uint_word(amount)])
}

pub fn approve(spender: Address, amount: u128) -> Vec<u8> {
    encode_call(APPROVE, &[address_word(spender), uint_word(amount)])
}

pub fn allowance(owner: Address, spender: Address) -> Vec<u8> {
    encode_call(ALLOWANCE, &[address_word(owner), address_word(spender)])
}

/// Split calldata into selector and argument words
pub fn decode_call(data: &[u8]) -> Result<(Selector, Vec<Word>)> {
    if data.len() < 4 || (data.len() - 4) % 32 != 0 {
        return Err(WalletError::Decode(format!(
            "calldata of {} bytes",
            data.len()
        )));
    }

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);

    let words = data[4..]
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect();

    Ok((selector, words))
}

/// Read a uint256 return value. Values above `u128::MAX` are rejected.
pub fn decode_uint(data: &[u8]) -> Result<u128> {
    if data.len() != 32 {
        return Err(WalletError::Decode(format!(
            "expected one word, got {} bytes",
            data.len()
        )));
    }
    if data[..16].iter().any(|b| *b != 0) {
        return Err(WalletError::Decode("uint256 exceeds 128 bits".into()));
    }

    let mut low = [0u8; 16];
    low.copy_from_slice(&data[16..]);
    Ok(u128::from_be_bytes(low))
}

pub fn decode_address(word: &Word) -> Result<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(WalletError::Decode("dirty address word".into()));
    }
    Address::from_slice(&word[12..])
}

/// `0x`-prefixed hex for JSON-RPC payloads
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| WalletError::Decode(format!("{raw}: {e}")))
}

/// Parse a JSON-RPC quantity such as `0x2105`
pub fn parse_quantity(raw: &str) -> Result<u128> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| WalletError::Decode(format!("quantity without 0x prefix: {raw}")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| WalletError::Decode(format!("{raw}: {e}")))
}
